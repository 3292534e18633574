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

    // Fire and forget.
    led.on().unwrap();
    pause!(500);

    // Wait for the board to apply the level.
    let pin = led.off().unwrap().await.unwrap();
    println!("Pin {} confirmed at {}", pin.id, pin.state);

    // Or be called back once it did.
    led.toggle()
        .unwrap()
        .then(|pin| async move {
            println!("Pin {} confirmed at {}", pin.id, pin.state);
            Ok(())
        })
        .unwrap();

    println!("{}", led);
}
