#![cfg(feature = "enabled")]

use kernel_qemu::{DebugConLogger, QEMU_DEBUG_PORT};
use kernel_sim::RegisterFilePorts;
use log::LevelFilter;

#[test]
fn installed_logger_writes_to_the_debug_port() {
    let logger: &'static DebugConLogger<RegisterFilePorts> = Box::leak(Box::new(
        DebugConLogger::new(RegisterFilePorts::new(), LevelFilter::Debug),
    ));
    logger.install().unwrap();

    log::info!(target: "fwdbg", "port 0x80 <- 0x12");
    log::trace!(target: "fwdbg", "filtered out");

    let out = String::from_utf8(logger.io().written_to(QEMU_DEBUG_PORT)).unwrap();
    assert_eq!(out, "[INFO] fwdbg: port 0x80 <- 0x12\n");
    assert_eq!(logger.io().write_count(), out.len());

    // a second install is refused
    assert!(logger.install().is_err());
}
