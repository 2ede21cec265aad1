//! Register event hooks
//!
//! The host learns about protocol traffic through a [`RegisterObserver`].
//! Hooks run synchronously inside [`crate::RtuSlave::poll`]:
//!
//! | Hook | When | Bytes passed |
//! |------|------|--------------|
//! | `on_holding_read` | after a successful FC03, before transmission | response without CRC |
//! | `on_input_read` | after a successful FC04, before transmission | response without CRC |
//! | `before_holding_write` | FC06 passed validation, before the value is stored | raw request, CRC included |
//!
//! Every hook has an empty default, and `()` observes nothing. Any state the
//! host needs in its hooks lives in the observer itself.

/// Host callbacks for register traffic
pub trait RegisterObserver {
    /// Holding registers were read
    fn on_holding_read(&mut self, _response: &[u8]) {}

    /// Input registers were read
    fn on_input_read(&mut self, _response: &[u8]) {}

    /// A holding register is about to be written
    fn before_holding_write(&mut self, _request: &[u8]) {}
}

/// No hooks
impl RegisterObserver for () {}

impl<T: RegisterObserver + ?Sized> RegisterObserver for &mut T {
    fn on_holding_read(&mut self, response: &[u8]) {
        (**self).on_holding_read(response)
    }

    fn on_input_read(&mut self, response: &[u8]) {
        (**self).on_input_read(response)
    }

    fn before_holding_write(&mut self, request: &[u8]) {
        (**self).before_holding_write(request)
    }
}
