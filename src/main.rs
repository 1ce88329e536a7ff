#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    community_admin::run().await
}
