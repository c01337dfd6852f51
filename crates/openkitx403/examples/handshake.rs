/*
[INPUT]:  None (in-process demonstration)
[OUTPUT]: Console output of one challenge/response round
[POS]:    Examples - protocol walkthrough without a network
[UPDATE]: When issuer, signer, or authenticator APIs change
*/

//! Example: one OpenKitx403 exchange, entirely in-process
//!
//! Issues a challenge, signs it with a fresh wallet, verifies the proof,
//! then shows the replay of the same proof being refused.

use openkitx403::{AuthConfig, Authenticator, Ed25519Signer, OpenKitClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AuthConfig::new("https://api.example", "demo-server");
    let auth = Authenticator::with_in_memory_store(config)?;
    let wallet = Ed25519Signer::generate();

    println!("=== OpenKitx403 Handshake Example ===");
    println!("Wallet: {}", wallet.public_key_base58());

    // Step 1: server answers an unauthenticated GET with a challenge
    let challenge = auth.issuer().issue("GET", "/api/nfts");
    let www_authenticate = auth.issuer().www_authenticate(&challenge)?;
    println!("\n403 WWW-Authenticate: {www_authenticate}");

    // Step 2: client signs it and builds the Authorization header
    let proof = OpenKitClient::build_proof(&wallet, &challenge.encode()?).await?;
    let authorization = proof.to_header_value();
    println!("\nAuthorization: {authorization}");

    // Step 3: server verifies
    let user = auth.verify(Some(&authorization), "GET", "/api/nfts").await?;
    println!("\nAccepted wallet: {}", user.address);

    // Step 4: the same header is refused the second time
    match auth.verify(Some(&authorization), "GET", "/api/nfts").await {
        Ok(_) => println!("Replay unexpectedly accepted"),
        Err(err) => println!("Replay refused: {err} ({})", err.http_status()),
    }

    Ok(())
}
