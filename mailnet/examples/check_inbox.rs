use mailnet::account::{AccountRegistry, JsonFileSettings, MailChecker};
use mailnet::auth::KeyringCredentials;
use mailnet::client::SessionClient;
use std::error::Error;
use std::sync::Arc;

/// Check every account stored in the OS keychain that has auto-login on.
///
/// Add one first with `KeyringCredentials::store`.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let credentials = Arc::new(KeyringCredentials::new());
    let settings = Arc::new(JsonFileSettings::open("mailnet-settings.json")?);
    let registry = AccountRegistry::new(credentials.clone(), settings);

    let discovered = registry.discover().await?;
    println!("Found {} account(s)", discovered.len());

    let accounts = registry.auto_login_accounts()?;
    let checker = MailChecker::new(SessionClient::new(), credentials);
    let results = checker.check_all(&accounts).await;

    for (account, result) in accounts.iter().zip(results) {
        match result {
            Ok(snapshot) => {
                println!("{}: {:?}", account.address(), account.state());
                for label in snapshot.labels.values() {
                    println!("  {:<12} {:>5} / {}", label.name, label.unread, label.total);
                }
                for snippet in snapshot.snippets.iter().take(5) {
                    println!("  - {} | {}", snippet.people, snippet.subject);
                }
            }
            Err(e) => println!("{}: failed ({e}, code {})", account.address(), e.as_i32()),
        }
    }
    Ok(())
}
