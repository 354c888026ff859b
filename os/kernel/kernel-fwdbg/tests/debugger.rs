use kernel_fwdbg::{FirmwareDebug, MASS_BUFFER_SIZE};
use kernel_sim::{RegisterFilePorts, SimulatedPlatform};
use std::thread;

const TOP: u64 = 0x4000_0000;

fn debugger(platform: &SimulatedPlatform) -> FirmwareDebug<&SimulatedPlatform, RegisterFilePorts> {
    FirmwareDebug::new(platform, RegisterFilePorts::new())
}

#[test]
fn memory_session() {
    let platform = SimulatedPlatform::new(TOP).with_high_memory(0x3000_0000);
    platform.poke(0x1000, &[0x42]);
    let dbg = debugger(&platform);

    assert_eq!(dbg.mem_read_dword(0x3FFF_FFFE), 0xFFFF_FFFF);
    assert_eq!(dbg.mem_read_byte(0x1000), 0x42);

    dbg.mem_write_word(0x2000, 0xBEEF);
    assert_eq!(dbg.mem_read_word(0x2000), 0xBEEF);

    dbg.mem_write_word(0x1FFF, 0xF00D);
    assert_eq!(dbg.mem_read_word(0x1FFF), 0xF00D);

    dbg.mem_write_byte(0x3000_0010, 0x7E);
    dbg.mem_write_dword(0x3000_0014, 0x0102_0304);
    assert_eq!(dbg.mem_read_byte(0x3000_0010), 0x7E);
    assert_eq!(dbg.mem_read_dword(0x3000_0014), 0x0102_0304);
    assert_eq!(platform.active_high_mappings(), 0);
}

#[test]
fn memory_writes_outside_ram_are_dropped() {
    let platform = SimulatedPlatform::new(TOP);
    let dbg = debugger(&platform);

    dbg.mem_write_dword(TOP, 0x1234_5678);
    dbg.mem_write_byte(u64::MAX, 1);
    assert_eq!(dbg.mem_read_byte(TOP), 0xFF);
    assert_eq!(platform.peek(TOP, 4), [0, 0, 0, 0]);
    assert_eq!(platform.device_mappings_total(), 0);
}

#[test]
fn mass_reads_match_byte_reads() {
    let platform = SimulatedPlatform::new(TOP);
    let bytes: Vec<u8> = (0..512u32).map(|i| (i * 7) as u8).collect();
    platform.poke(0x7F00, &bytes);
    let dbg = debugger(&platform);

    let buf = dbg.mem_read_mass(0x7F80);
    assert_eq!(buf.len(), MASS_BUFFER_SIZE);
    for (i, &b) in (0..).zip(buf.iter()) {
        assert_eq!(b, dbg.mem_read_byte(0x7F80 + i));
    }

    assert!(dbg.mem_read_mass(TOP - 0x80).is_sentinel());
}

#[test]
fn port_write_then_read() {
    let platform = SimulatedPlatform::new(TOP);
    let dbg = debugger(&platform);

    dbg.io_write_byte(0x80, 0xAB);
    assert_eq!(dbg.io_read_byte(0x80), 0xAB);
    assert_eq!(dbg.ports().written_to(0x80), [0xAB]);
}

#[test]
fn port_mass_read_wraps() {
    let platform = SimulatedPlatform::new(TOP);
    let dbg = debugger(&platform);
    dbg.io_write_byte(0xFFFF, 0x11);
    dbg.io_write_byte(0x0000, 0x22);

    let buf = dbg.io_read_mass(0xFFFF);
    assert_eq!(buf[0], 0x11);
    assert_eq!(buf[1], 0x22);
    assert!(buf[2..].iter().all(|&b| b == 0));
}

#[test]
fn memory_and_port_bulk_reads_share_one_length() {
    let platform = SimulatedPlatform::new(TOP);
    let dbg = debugger(&platform);

    let ports: [u8; MASS_BUFFER_SIZE] = dbg.io_read_mass(0x3F8);
    let memory: [u8; kernel_physmem::info::MASS_BUFFER_SIZE] =
        dbg.mem_read_mass(0x1000).into_bytes();
    assert_eq!(ports.len(), memory.len());
}

#[test]
fn shared_between_threads() {
    let platform = SimulatedPlatform::new(TOP)
        .with_high_memory(0x3000_0000)
        .with_mmio(0xA_0000..0xB_0000);
    let dbg = debugger(&platform);

    thread::scope(|s| {
        for t in 0..4u64 {
            let dbg = &dbg;
            s.spawn(move || {
                for i in 0..256u64 {
                    for base in [0x10_0000, 0x3000_0000, 0xA_0000] {
                        let addr = base + t * 0x400 + i * 4;
                        let value = ((t << 16) | i) as u32;
                        dbg.mem_write_dword(addr, value);
                        assert_eq!(dbg.mem_read_dword(addr), value);
                    }
                }
            });
        }
    });

    assert_eq!(platform.active_high_mappings(), 0);
    assert_eq!(platform.active_device_mappings(), 0);
    assert!(!platform.saw_overlapping_high_mappings());
    assert!(!platform.saw_overlapping_device_mappings());
}

#[cfg(feature = "qemu")]
#[test]
fn console_logger_shares_the_port_bus() {
    use kernel_qemu::QEMU_DEBUG_PORT;
    use log::{Level, LevelFilter, Log, Record};

    let platform = SimulatedPlatform::new(TOP);
    let dbg = debugger(&platform);
    let logger = dbg.console_logger(LevelFilter::Warn);

    logger.log(
        &Record::builder()
            .level(Level::Warn)
            .target("kernel_physmem::mapper")
            .args(format_args!("frame unavailable"))
            .build(),
    );

    let out = String::from_utf8(dbg.ports().written_to(QEMU_DEBUG_PORT)).unwrap();
    assert_eq!(out, "[WARN] kernel_physmem::mapper: frame unavailable\n");
}
