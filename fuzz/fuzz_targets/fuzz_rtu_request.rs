#![no_main]

//! Arbitrary byte bursts with arbitrary gaps fed to a slave.
//!
//! Every response must carry a valid CRC, and only writes may touch the
//! holding table.

use std::collections::VecDeque;
use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rtu_slave::{checksum, ManualClock, RegisterBank, RtuSlave, SlaveConfig, Transaction};

#[derive(Debug, Arbitrary)]
struct Burst {
    gap_us: u16,
    bytes: Vec<u8>,
}

fuzz_target!(|bursts: Vec<Burst>| {
    let mut input = [0x1111u16; 32];
    let mut holding = [0x2222u16; 32];
    let registers = RegisterBank::new(&mut input, &mut holding).unwrap();
    let clock = ManualClock::default();
    let mut slave = RtuSlave::new(
        SlaveConfig::new(1),
        registers,
        VecDeque::<u8>::new(),
        Vec::<u8>::new(),
        &clock,
    )
    .unwrap();

    let mut writes = 0;
    for burst in bursts {
        clock.advance(Duration::from_micros(u64::from(burst.gap_us)));
        slave.source_mut().extend(burst.bytes.iter().copied());

        let transaction = slave.poll().unwrap();
        if matches!(transaction, Transaction::Written { .. }) {
            writes += 1;
        }

        let sent = slave.sink().clone();
        if !sent.is_empty() {
            assert!(sent.len() >= 5);
            assert!(checksum::verify(&sent, sent.len() - 2).unwrap());
            assert_eq!(sent[0], 1);
        }
        slave.sink_mut().clear();
    }

    if writes == 0 {
        assert!(slave
            .registers()
            .registers(rtu_slave::RegisterKind::Holding)
            .iter()
            .all(|&v| v == 0x2222));
    }
});
