#[actix_web::main]
async fn main() -> std::io::Result<()> {
    ma_commune_server::run().await
}
