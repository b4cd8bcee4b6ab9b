//! Tokio driver: independent read and write completion tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use wedo_hub::mock::{MockHidLink, MockRegistry};
use wedo_hub::prelude::*;
use wedo_hub::channel;

const MOTOR_REPORT: [u8; 8] = [0x00, 0xA0, 0, 240, 0, 0, 0, 0];

async fn wait_until(mut ready: impl FnMut() -> bool) -> bool {
    timeout(Duration::from_secs(5), async {
        while !ready() {
            sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .is_ok()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_driver_runs_read_and_write_completions() -> Result<(), Box<dyn std::error::Error>> {
    let link = Arc::new(MockHidLink::new());
    let (transport, driver) = channel(Arc::clone(&link));
    let config = HubConfig::builder().port_debounce_threshold(2).build()?;
    let hub = Arc::new(Hub::new(
        "hub0",
        config,
        Arc::new(transport),
        Arc::new(MockRegistry::new()),
    )?);
    let driver = tokio::spawn(driver.run(Arc::clone(&hub)));
    hub.start()?;

    link.push_report(MOTOR_REPORT);
    link.push_report(MOTOR_REPORT);
    assert!(wait_until(|| hub.motor(PortId::Port1).is_ok()).await);

    let motor = hub.motor(PortId::Port1)?;
    motor.set_command(MotorCommand::Run)?;
    motor.set_duty_cycle(50)?;
    link.push_report(MOTOR_REPORT);

    timeout(Duration::from_secs(5), link.wait_for_writes(1)).await?;
    assert_eq!(link.written()[0], vec![0x20, 77, 0, 0, 0, 0, 0, 0]);

    let blocking = Arc::clone(&hub);
    tokio::task::spawn_blocking(move || blocking.shutdown()).await?;
    timeout(Duration::from_secs(5), driver).await??;

    assert_eq!(hub.counters().snapshot().reports_received, 3);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_driver_retries_faulted_write() -> Result<(), Box<dyn std::error::Error>> {
    let link = Arc::new(MockHidLink::new());
    let (transport, driver) = channel(Arc::clone(&link));
    let hub = Arc::new(Hub::new(
        "hub0",
        HubConfig::default(),
        Arc::new(transport),
        Arc::new(NullRegistry),
    )?);
    let driver = tokio::spawn(driver.run(Arc::clone(&hub)));
    hub.start()?;

    link.inject_write_fault(TransportError::Failed(-71));
    hub.set_high_power(true);
    link.push_report([0x40, 0x90, 0, 0, 0, 0, 0, 0]);

    timeout(Duration::from_secs(5), link.wait_for_writes(2)).await?;
    let written = link.written();
    assert_eq!(written[0], written[1]);
    assert!(wait_until(|| hub.counters().snapshot().write_retries == 1).await);
    assert!(wait_until(|| hub.wait_drained_for(Duration::ZERO)).await);
    assert!(hub.high_power());

    let blocking = Arc::clone(&hub);
    tokio::task::spawn_blocking(move || blocking.shutdown()).await?;
    timeout(Duration::from_secs(5), driver).await??;
    Ok(())
}
