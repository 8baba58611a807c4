use mmctester::{BoardBuilder, Level, PinMode, pins};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example:
    //   cargo run --example pin_io -- /dev/ttyACM0 12
    let mut args = std::env::args().skip(1);
    let port = args.next().ok_or("missing <port>")?;
    let pin: u8 = args.next().ok_or("missing <pin>")?.parse()?;

    let mut board = BoardBuilder::new().open(&port)?;

    board.pin_mode(pin, PinMode::Output)?;
    board.digital_write(pin, Level::High)?;
    println!("Pin {pin}: {:?}", board.digital_read(pin)?);
    board.digital_write(pin, Level::Low)?;
    println!("Pin {pin}: {:?}", board.digital_read(pin)?);

    board.pin_mode(pins::A0, PinMode::Input)?;
    println!("A0: {}", board.analog_read(pins::A0)?);

    board.close();
    Ok(())
}
