use lumen::devices::Led;
use lumen::hardware::Board;
use lumen::mocks::io_protocol::MockIoProtocol;
use lumen::pause;

#[lumen::runtime]
async fn main() {
    let board = Board::new(MockIoProtocol::default())
        .open()
        .expect("Mocked board opens");

    // Register a LED on pin 11: PWM capable, the intensity varies continuously.
    let mut led = Led::new(&board, 11).expect("Led is instantiated");
    for step in 0..=10 {
        led.set_intensity(step as f64 / 10.0).unwrap();
        println!("{}", led);
        pause!(100);
    }

    // Register a LED on pin 13: no PWM, the intensity is rounded to on/off.
    let mut led = Led::new(&board, 13).expect("Embedded led is instantiated");
    for intensity in [0.2, 0.5, 0.8] {
        led.set_intensity(intensity).unwrap();
        println!("Asked {} got {}", intensity, led.get_intensity());
    }
}
