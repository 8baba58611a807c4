use std::time::Duration;

use mmctester::commands::{LedFunction, SetFruLedState};
use mmctester::{BoardBuilder, HotSwapHandle, Level, PinMode, Target};

const PIN_POWER_GOOD: u8 = 13;
const PIN_HOT_SWAP: u8 = 12;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example:
    //   cargo run --example hotswap_monitor -- /dev/ttyACM0 0xa2
    let mut args = std::env::args().skip(1);
    let port = args.next().ok_or("missing <port>")?;
    let target = match args.next() {
        Some(addr) => u8::from_str_radix(addr.trim_start_matches("0x"), 16)?,
        None => 0xA2,
    };
    let target = Target::new(target);

    let mut board = BoardBuilder::new()
        .timeout(Duration::from_secs(1))
        .max_retries(3)
        .open(&port)?;

    board.pin_mode(PIN_POWER_GOOD, PinMode::Output)?;
    board.pin_mode(PIN_HOT_SWAP, PinMode::Output)?;
    if !board.is_ipmc_accessible(&target)? {
        return Err("management controller does not answer".into());
    }

    loop {
        if let Some(event) = board.receive_and_ack()? {
            println!("Event: {event:?}");
            match event.hot_swap_handle() {
                Some(HotSwapHandle::Closed) => {
                    board.execute(&target, SetFruLedState::hot_swap_led(LedFunction::LongBlink))?;
                    std::thread::sleep(Duration::from_secs(5));
                    board.execute(&target, SetFruLedState::hot_swap_led(LedFunction::Off))?;
                    board.digital_write(PIN_POWER_GOOD, Level::High)?;
                    println!("Payload enabled");
                }
                Some(HotSwapHandle::Open) => {
                    board.execute(&target, SetFruLedState::hot_swap_led(LedFunction::ShortBlink))?;
                    std::thread::sleep(Duration::from_secs(5));
                    board.execute(&target, SetFruLedState::hot_swap_led(LedFunction::Off))?;
                    board.digital_write(PIN_POWER_GOOD, Level::Low)?;
                    println!("Payload disabled");
                }
                None => {}
            }
        }

        let unprocessed = board.pop_unprocessed();
        if !unprocessed.is_empty() {
            println!("Unknown messages: {unprocessed:?}");
        }
    }
}
