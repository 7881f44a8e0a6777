#[tokio::main]
async fn main() {
    if let Err(err) = isl_gesture_lib::run().await {
        log::error!("isl-gesture failed: {err:#}");
        eprintln!("isl-gesture failed: {err:#}");
        std::process::exit(1);
    }
}
