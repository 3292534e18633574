use lumen::devices::Led;
use lumen::hardware::Board;
use lumen::mocks::io_protocol::MockIoProtocol;
use lumen::pause;

#[lumen::runtime]
async fn main() {
    let board = Board::new(MockIoProtocol::default().with_latency(20))
        .open()
        .expect("Mocked board opens");

    // Register a LED on pin 13 (arduino embedded led).
    let mut led = Led::new(&board, 13).expect("Embedded led is instantiated");

    // Blinks the LED every 250ms (for 2sec).
    led.blink_with(250, |pin| async move {
        println!("Blink: pin {} is now {}", pin.id, pin.state);
        Ok(())
    })
    .unwrap();
    pause!(2000);

    // Slow down: the running loop picks the new interval up.
    led.blink(500);
    pause!(2000);

    // Stop blinking: the LED is turned off.
    led.stop_blink().unwrap();
}
