//! Walks a running user-store-service through one full user lifecycle.
//!
//! Usage: user-store-demo [BASE_URL]

use user_store_client::{UserStoreClient, DEFAULT_BASE_URL};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let base_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let client = UserStoreClient::new(&base_url, None);

    println!("Health: {:?}", client.health().await);
    println!("Create: {:?}", client.create_user("Alice", 123, None).await);
    println!("Add data: {:?}", client.add_user_data("grade", "A", "Alice", 123, None).await);
    println!("Get user: {:?}", client.get_user("Alice", 123, None).await);
    println!("Add ctx: {:?}", client.add_user_context("First note", "Alice", 123, None).await);
    println!("Get ctx: {:?}", client.get_user_context(Some("Alice"), None, 123, None).await);
    println!("Clear ctx: {:?}", client.clear_user_context("Alice", 123, None).await);
    println!("Delete: {:?}", client.delete_user("Alice", 123, true, None).await);

    client.disconnect();
}
