//! End-to-end behavior of the slave over an in-memory line.

use std::collections::VecDeque;
use std::time::Duration;

use rtu_slave::checksum;
use rtu_slave::{
    ManualClock, ModbusException, RegisterBank, RegisterKind, RegisterObserver, RtuSlave,
    SlaveConfig, Transaction,
};

type TestSlave<'r, 'c, O = ()> = RtuSlave<'r, VecDeque<u8>, Vec<u8>, &'c ManualClock, O>;

const READ_HOLDING_0: [u8; 8] = [0x01, 0x03, 0x00, 0x00, 0x00, 0x01, 0x84, 0x0A];
const WRITE_HOLDING_0: [u8; 8] = [0x01, 0x06, 0x00, 0x00, 0x9A, 0x01, 0x22, 0xAA];

fn slave<'r, 'c>(
    input: &'r mut [u16],
    holding: &'r mut [u16],
    clock: &'c ManualClock,
) -> TestSlave<'r, 'c> {
    let registers = RegisterBank::new(input, holding).unwrap();
    RtuSlave::new(
        SlaveConfig::new(1),
        registers,
        VecDeque::new(),
        Vec::new(),
        clock,
    )
    .unwrap()
}

fn send<O: RegisterObserver>(slave: &mut TestSlave<'_, '_, O>, bytes: &[u8]) -> Transaction {
    slave.source_mut().extend(bytes.iter().copied());
    slave.poll().unwrap()
}

fn framed(payload: [u8; 6]) -> [u8; 8] {
    let mut raw = [0u8; 8];
    raw[..6].copy_from_slice(&payload);
    checksum::append(&mut raw, 6).unwrap();
    raw
}

#[test]
fn read_holding_register() {
    let clock = ManualClock::default();
    let mut input = [0u16; 16];
    let mut holding = [0u16; 16];
    holding[0] = 0x1234;
    let mut slave = slave(&mut input, &mut holding, &clock);

    let transaction = send(&mut slave, &READ_HOLDING_0);

    assert_eq!(
        transaction,
        Transaction::Read {
            kind: RegisterKind::Holding,
            first_register: 0,
            count: 1
        }
    );
    assert_eq!(
        slave.sink(),
        &vec![0x01, 0x03, 0x02, 0x34, 0x12, 0x2E, 0x89]
    );
}

#[test]
fn read_input_registers() {
    let clock = ManualClock::default();
    let mut input = [0x0011u16, 0x0022, 0x0033, 0x0044];
    let mut holding = [0u16; 4];
    let mut slave = slave(&mut input, &mut holding, &clock);

    send(&mut slave, &[0x01, 0x04, 0x00, 0x00, 0x00, 0x02, 0x71, 0xCB]);

    assert_eq!(
        slave.sink(),
        &vec![0x01, 0x04, 0x04, 0x11, 0x00, 0x22, 0x00, 0xE6, 0x18]
    );
}

#[test]
fn write_single_register_echoes_request() {
    let clock = ManualClock::default();
    let mut input = [0u16; 16];
    let mut holding = [0u16; 16];
    {
        let mut slave = slave(&mut input, &mut holding, &clock);
        let transaction = send(&mut slave, &WRITE_HOLDING_0);

        assert_eq!(transaction.written_value(), Some(0x9A01));
        assert_eq!(slave.sink().as_slice(), &WRITE_HOLDING_0);
    }
    assert_eq!(holding[0], 0x9A01);
}

#[test]
fn written_value_reads_back() {
    let clock = ManualClock::default();
    let mut input = [0u16; 16];
    let mut holding = [0u16; 16];
    let mut slave = slave(&mut input, &mut holding, &clock);

    send(&mut slave, &framed([0x01, 0x06, 0x00, 0x05, 0xBE, 0xEF]));
    slave.sink_mut().clear();
    send(&mut slave, &framed([0x01, 0x03, 0x00, 0x05, 0x00, 0x01]));

    assert_eq!(&slave.sink()[..5], &[0x01, 0x03, 0x02, 0xEF, 0xBE]);
    assert!(checksum::verify(slave.sink(), 5).unwrap());
}

#[test]
fn unsupported_function_gets_illegal_function() {
    let clock = ManualClock::default();
    let mut input = [0u16; 16];
    let mut holding = [0u16; 16];
    let mut slave = slave(&mut input, &mut holding, &clock);

    let transaction = send(&mut slave, &[0x01, 0x05, 0x00, 0x00, 0xFF, 0x00, 0x8C, 0x3A]);

    assert_eq!(
        transaction,
        Transaction::Exception {
            function_code: 0x05,
            exception: ModbusException::IllegalFunction
        }
    );
    assert_eq!(slave.sink(), &vec![0x01, 0x85, 0x01, 0x83, 0x50]);
}

#[test]
fn other_slave_address_is_ignored() {
    let clock = ManualClock::default();
    let mut input = [0u16; 16];
    let mut holding = [0u16; 16];
    let mut slave = slave(&mut input, &mut holding, &clock);

    let transaction = send(&mut slave, &[0x02, 0x03, 0x00, 0x00, 0x00, 0x01, 0x84, 0x39]);

    assert_eq!(transaction, Transaction::Idle);
    assert!(slave.sink().is_empty());
    assert_eq!(slave.stats().address_mismatches, 1);
}

#[test]
fn read_past_end_gets_illegal_data_address() {
    let clock = ManualClock::default();
    let mut input = [0u16; 16];
    let mut holding = [0u16; 16];
    let mut slave = slave(&mut input, &mut holding, &clock);

    send(&mut slave, &[0x01, 0x03, 0x00, 0x0F, 0x00, 0x02, 0xF4, 0x08]);

    assert_eq!(slave.sink(), &vec![0x01, 0x83, 0x02, 0xC0, 0xF1]);
}

#[test]
fn write_past_end_leaves_registers_untouched() {
    let clock = ManualClock::default();
    let mut input = [0u16; 16];
    let mut holding = [0u16; 16];
    {
        let mut slave = slave(&mut input, &mut holding, &clock);
        let transaction = send(&mut slave, &framed([0x01, 0x06, 0x00, 0x10, 0x00, 0x01]));

        assert_eq!(
            transaction,
            Transaction::Exception {
                function_code: 0x06,
                exception: ModbusException::IllegalDataAddress
            }
        );
        assert_eq!(&slave.sink()[..3], &[0x01, 0x86, 0x02]);
    }
    assert_eq!(holding, [0u16; 16]);
}

#[test]
fn corrupted_crc_gets_no_response() {
    let clock = ManualClock::default();
    let mut input = [0u16; 16];
    let mut holding = [0u16; 16];
    {
        let mut slave = slave(&mut input, &mut holding, &clock);

        let mut corrupt = WRITE_HOLDING_0;
        corrupt[4] ^= 0x01;
        assert_eq!(send(&mut slave, &corrupt), Transaction::Idle);

        let mut bad_crc = READ_HOLDING_0;
        bad_crc[6] = 0x00;
        assert_eq!(send(&mut slave, &bad_crc), Transaction::Idle);

        assert!(slave.sink().is_empty());
        assert_eq!(slave.stats().crc_errors, 2);
    }
    assert_eq!(holding[0], 0);
}

#[test]
fn fragmented_request_within_timeout_is_answered() {
    let clock = ManualClock::default();
    let mut input = [0u16; 16];
    let mut holding = [0u16; 16];
    holding[0] = 0x1234;
    let mut slave = slave(&mut input, &mut holding, &clock);
    let timeout = slave.config().inter_frame_timeout();

    for byte in READ_HOLDING_0 {
        assert!(slave.sink().is_empty());
        send(&mut slave, &[byte]);
        clock.advance(timeout / 2);
    }

    assert_eq!(
        slave.sink(),
        &vec![0x01, 0x03, 0x02, 0x34, 0x12, 0x2E, 0x89]
    );
}

#[test]
fn slow_bytes_never_form_a_frame() {
    let clock = ManualClock::default();
    let mut input = [0u16; 16];
    let mut holding = [0u16; 16];
    let mut slave = slave(&mut input, &mut holding, &clock);
    let timeout = slave.config().inter_frame_timeout();

    for byte in READ_HOLDING_0 {
        send(&mut slave, &[byte]);
        clock.advance(timeout + Duration::from_micros(1));
        assert_eq!(slave.poll().unwrap(), Transaction::Idle);
    }

    assert!(slave.sink().is_empty());
    assert_eq!(slave.stats().framing_errors, 8);
}

#[test]
fn aborted_frame_does_not_poison_next_request() {
    let clock = ManualClock::default();
    let mut input = [0u16; 16];
    let mut holding = [0u16; 16];
    holding[0] = 0x1234;
    let mut slave = slave(&mut input, &mut holding, &clock);
    let timeout = slave.config().inter_frame_timeout();

    send(&mut slave, &WRITE_HOLDING_0[..5]);
    clock.advance(timeout * 3);
    send(&mut slave, &READ_HOLDING_0);

    assert_eq!(
        slave.sink(),
        &vec![0x01, 0x03, 0x02, 0x34, 0x12, 0x2E, 0x89]
    );
    assert_eq!(slave.stats().framing_errors, 1);
}

#[test]
fn back_to_back_requests_each_answered() {
    let clock = ManualClock::default();
    let mut input = [0u16; 16];
    let mut holding = [0u16; 16];
    let mut slave = slave(&mut input, &mut holding, &clock);

    send(&mut slave, &WRITE_HOLDING_0);
    clock.advance(Duration::from_millis(1));
    send(&mut slave, &READ_HOLDING_0);

    let sink = slave.sink();
    assert_eq!(&sink[..8], &WRITE_HOLDING_0);
    assert_eq!(&sink[8..], &[0x01, 0x03, 0x02, 0x01, 0x9A, 0x39, 0xBF]);
    assert_eq!(slave.stats().responses_sent, 2);
}

#[test]
fn observer_sees_reads_and_writes() {
    #[derive(Default)]
    struct Hooks {
        events: Vec<(&'static str, Vec<u8>)>,
    }

    impl RegisterObserver for Hooks {
        fn on_holding_read(&mut self, response: &[u8]) {
            self.events.push(("holding", response.to_vec()));
        }

        fn on_input_read(&mut self, response: &[u8]) {
            self.events.push(("input", response.to_vec()));
        }

        fn before_holding_write(&mut self, request: &[u8]) {
            self.events.push(("write", request.to_vec()));
        }
    }

    let clock = ManualClock::default();
    let mut input = [0u16; 4];
    let mut holding = [0u16; 4];
    holding[0] = 0x1234;
    let mut slave = slave(&mut input, &mut holding, &clock).with_observer(Hooks::default());

    send(&mut slave, &READ_HOLDING_0);
    send(&mut slave, &framed([0x01, 0x04, 0x00, 0x00, 0x00, 0x01]));
    send(&mut slave, &WRITE_HOLDING_0);
    // Rejected requests raise no hooks
    send(&mut slave, &framed([0x01, 0x03, 0x00, 0x04, 0x00, 0x01]));

    assert_eq!(
        slave.observer().events,
        vec![
            ("holding", vec![0x01, 0x03, 0x02, 0x34, 0x12]),
            ("input", vec![0x01, 0x04, 0x02, 0x00, 0x00]),
            ("write", WRITE_HOLDING_0.to_vec()),
        ]
    );
}

#[test]
fn host_bulk_operations() {
    let clock = ManualClock::default();
    let mut input = [0u16; 4];
    let mut holding = [0u16; 4];
    let mut slave = slave(&mut input, &mut holding, &clock);

    assert!(slave
        .registers_mut()
        .bulk_load(RegisterKind::Input, 1, &[0xAAAA, 0xBBBB]));
    assert!(!slave
        .registers_mut()
        .bulk_load(RegisterKind::Input, 3, &[1, 2]));

    send(&mut slave, &framed([0x01, 0x04, 0x00, 0x01, 0x00, 0x02]));
    assert_eq!(&slave.sink()[3..7], &[0xAA, 0xAA, 0xBB, 0xBB]);

    send(&mut slave, &framed([0x01, 0x06, 0x00, 0x02, 0x0B, 0xB8]));
    let mut out = [0u16; 2];
    assert!(slave
        .registers()
        .bulk_store(RegisterKind::Holding, 2, &mut out));
    assert_eq!(out, [3000, 0]);
}
