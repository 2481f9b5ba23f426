#[actix_web::main]
async fn main() -> std::io::Result<()> {
    desa_surat_server::run().await
}
