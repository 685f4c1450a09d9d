// disable console in windows release builds
#![cfg_attr(
    all(
        target_os = "windows",
        not(debug_assertions),
    ),
    windows_subsystem = "windows"
)]

#[macroquad::main("Drumline")]
async fn main() {
    env_logger::init();
    drumline::run(std::env::args().nth(1)).await
}
