/*
[INPUT]:  Keypair file path and protected URL (command-line arguments)
[OUTPUT]: Console output of the authenticated response
[POS]:    Examples - calling a protected endpoint with a stored wallet
[UPDATE]: When KeypairFile or OpenKitClient API changes
*/

//! Example: authenticated GET with a keypair file
//!
//! ```text
//! cargo run --example keypair_client -- ./wallet.json http://localhost:8000/api/profile
//! ```
//!
//! The keypair file is created on first use.

use openkitx403::{KeypairFile, OpenKitClient};
use reqwest::Method;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let keypair_path = args.next().unwrap_or_else(|| "./wallet.json".to_string());
    let url = args
        .next()
        .unwrap_or_else(|| "http://localhost:8000/api/profile".to_string());

    let wallet = KeypairFile::new(&keypair_path).load_or_create()?;
    println!("Wallet {} from {keypair_path}", wallet.public_key_base58());

    let client = OpenKitClient::new()?;
    let response = client.authenticate(&wallet, Method::GET, &url, None).await?;

    println!("Status: {}", response.status());
    println!("{}", response.text().await?);
    Ok(())
}
