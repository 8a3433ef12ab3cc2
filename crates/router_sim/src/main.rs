#[tokio::main]
async fn main() {
    if let Err(e) = lib_router_sim::init().await {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}
