//! # Register Bank
//!
//! Bounds-checked view over two host-owned register tables.
//!
//! The host allocates the input and holding arrays and lends them to the
//! slave for its lifetime. Protocol-facing operations ([`RegisterBank::read_range`],
//! [`RegisterBank::write_single`]) reject out-of-range access with
//! [`ModbusError::OutOfRange`], which the dispatcher turns into an
//! Illegal Data Address exception. Host-facing bulk copies
//! ([`RegisterBank::bulk_load`], [`RegisterBank::bulk_store`]) silently skip
//! requests that do not fit.
//!
//! ```rust
//! use rtu_slave::{RegisterBank, RegisterKind};
//!
//! let mut input = [0u16; 4];
//! let mut holding = [0u16; 2];
//! let mut bank = RegisterBank::new(&mut input, &mut holding).unwrap();
//!
//! assert!(bank.bulk_load(RegisterKind::Input, 1, &[10, 20]));
//! assert_eq!(bank.read_range(RegisterKind::Input, 0, 3).unwrap(), &[0, 10, 20]);
//! assert!(bank.write_single(2, 7).is_err());
//! ```

use tracing::debug;

use crate::error::{ModbusError, ModbusResult};
use crate::protocol::RegisterKind;

/// Borrowed input and holding register tables
#[derive(Debug)]
pub struct RegisterBank<'r> {
    input: &'r mut [u16],
    holding: &'r mut [u16],
}

impl<'r> RegisterBank<'r> {
    /// Wrap host storage. Both tables must be non-empty.
    pub fn new(input: &'r mut [u16], holding: &'r mut [u16]) -> ModbusResult<Self> {
        if input.is_empty() {
            return Err(ModbusError::configuration(
                "input register table must not be empty",
            ));
        }
        if holding.is_empty() {
            return Err(ModbusError::configuration(
                "holding register table must not be empty",
            ));
        }
        Ok(Self { input, holding })
    }

    /// Number of registers in a table
    pub fn size(&self, kind: RegisterKind) -> usize {
        self.table(kind).len()
    }

    /// Read `count` registers starting at `start`.
    pub fn read_range(&self, kind: RegisterKind, start: u16, count: u16) -> ModbusResult<&[u16]> {
        let table = self.table(kind);
        let range = fit_range(start, usize::from(count), table.len()).ok_or(ModbusError::OutOfRange {
            kind,
            start,
            count,
            size: table.len(),
        })?;
        Ok(&table[range])
    }

    /// Write one holding register.
    pub fn write_single(&mut self, register: u16, value: u16) -> ModbusResult<()> {
        let size = self.holding.len();
        let slot = self
            .holding
            .get_mut(usize::from(register))
            .ok_or(ModbusError::OutOfRange {
                kind: RegisterKind::Holding,
                start: register,
                count: 1,
                size,
            })?;
        *slot = value;
        Ok(())
    }

    /// Copy `values` into a table starting at `start`.
    ///
    /// Returns `false` and leaves the table untouched if the range does not fit.
    pub fn bulk_load(&mut self, kind: RegisterKind, start: u16, values: &[u16]) -> bool {
        let table = self.table_mut(kind);
        match fit_range(start, values.len(), table.len()) {
            Some(range) => {
                table[range].copy_from_slice(values);
                true
            }
            None => {
                debug!(
                    "Ignoring bulk load of {} {} registers at {}",
                    values.len(),
                    kind,
                    start
                );
                false
            }
        }
    }

    /// Copy registers starting at `start` into `out`.
    ///
    /// Returns `false` and leaves `out` untouched if the range does not fit.
    pub fn bulk_store(&self, kind: RegisterKind, start: u16, out: &mut [u16]) -> bool {
        let table = self.table(kind);
        match fit_range(start, out.len(), table.len()) {
            Some(range) => {
                out.copy_from_slice(&table[range]);
                true
            }
            None => {
                debug!(
                    "Ignoring bulk store of {} {} registers at {}",
                    out.len(),
                    kind,
                    start
                );
                false
            }
        }
    }

    /// Direct read access to a table
    pub fn registers(&self, kind: RegisterKind) -> &[u16] {
        self.table(kind)
    }

    fn table(&self, kind: RegisterKind) -> &[u16] {
        match kind {
            RegisterKind::Input => &*self.input,
            RegisterKind::Holding => &*self.holding,
        }
    }

    fn table_mut(&mut self, kind: RegisterKind) -> &mut [u16] {
        match kind {
            RegisterKind::Input => &mut *self.input,
            RegisterKind::Holding => &mut *self.holding,
        }
    }
}

fn fit_range(start: u16, len: usize, size: usize) -> Option<std::ops::Range<usize>> {
    let start = usize::from(start);
    let end = start.checked_add(len)?;
    (end <= size).then_some(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tables_rejected() {
        let mut input: [u16; 0] = [];
        let mut holding = [0u16; 4];
        let err = RegisterBank::new(&mut input, &mut holding).unwrap_err();
        assert!(matches!(err, ModbusError::Configuration { .. }));

        let mut input = [0u16; 4];
        let mut holding: [u16; 0] = [];
        assert!(RegisterBank::new(&mut input, &mut holding).is_err());
    }

    #[test]
    fn test_read_range_bounds() {
        let mut input = [1u16, 2, 3, 4];
        let mut holding = [0x1234u16, 0x5678];
        let bank = RegisterBank::new(&mut input, &mut holding).unwrap();

        assert_eq!(bank.size(RegisterKind::Input), 4);
        assert_eq!(bank.read_range(RegisterKind::Input, 1, 3).unwrap(), &[2, 3, 4]);
        assert_eq!(bank.read_range(RegisterKind::Holding, 0, 2).unwrap(), &[0x1234, 0x5678]);
        assert!(bank.read_range(RegisterKind::Holding, 2, 0).unwrap().is_empty());

        let err = bank.read_range(RegisterKind::Holding, 1, 2).unwrap_err();
        assert!(matches!(
            err,
            ModbusError::OutOfRange {
                kind: RegisterKind::Holding,
                start: 1,
                count: 2,
                size: 2
            }
        ));
        assert!(bank.read_range(RegisterKind::Input, 0xFFFF, 0xFFFF).is_err());
    }

    #[test]
    fn test_write_single() {
        let mut input = [0u16; 2];
        let mut holding = [0u16; 3];
        {
            let mut bank = RegisterBank::new(&mut input, &mut holding).unwrap();
            bank.write_single(2, 0xBEEF).unwrap();
            assert!(bank.write_single(3, 1).is_err());
            assert_eq!(bank.registers(RegisterKind::Holding), &[0, 0, 0xBEEF]);
        }
        assert_eq!(holding, [0, 0, 0xBEEF]);
        assert_eq!(input, [0, 0]);
    }

    #[test]
    fn test_bulk_load_and_store() {
        let mut input = [0u16; 4];
        let mut holding = [0u16; 4];
        let mut bank = RegisterBank::new(&mut input, &mut holding).unwrap();

        assert!(bank.bulk_load(RegisterKind::Holding, 2, &[7, 8]));
        assert!(!bank.bulk_load(RegisterKind::Holding, 3, &[9, 9]));
        assert_eq!(bank.registers(RegisterKind::Holding), &[0, 0, 7, 8]);

        let mut out = [0u16; 2];
        assert!(bank.bulk_store(RegisterKind::Holding, 2, &mut out));
        assert_eq!(out, [7, 8]);

        let mut out = [0xAAAAu16; 3];
        assert!(!bank.bulk_store(RegisterKind::Input, 2, &mut out));
        assert_eq!(out, [0xAAAA; 3]);
    }
}
