use lumen::devices::Led;
use lumen::hardware::Board;
use lumen::mocks::io_protocol::MockIoProtocol;

#[lumen::runtime]
async fn main() {
    let board = Board::new(MockIoProtocol::default())
        .open()
        .expect("Mocked board opens");

    // Register an active low LED on pin 9: the pin sinks the current, "on" is level 0.
    let mut led = Led::with_drive_mode(&board, 9, Led::SYNC_DRIVE).expect("Led is instantiated");

    led.on().unwrap().await.unwrap();
    println!("On: raw level {}", led.get_intensity());

    // 75% brightness is a 25% raw level.
    led.set_intensity(0.75).unwrap().await.unwrap();
    println!("75%: raw level {}", led.get_intensity());

    led.off().unwrap().await.unwrap();
    println!("Off: raw level {}", led.get_intensity());
}
