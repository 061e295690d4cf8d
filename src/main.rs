use poke_portal::rocket_initialize;

#[rocket::main]
async fn main() {
    if let Err(e) = rocket_initialize().launch().await {
        eprintln!("PokéPortal failed to launch: {e}");
        std::process::exit(1);
    }
}
