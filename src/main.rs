#[actix_web::main]
async fn main() -> std::io::Result<()> {
    recommendation_letter_server::run().await
}
