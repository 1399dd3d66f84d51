use std::collections::HashMap;

pub(crate) const SERVICE_NAME: &str = "cesto";

/// Keyring slot for the list-service password.
pub const BACKEND_PASSWORD: &str = "backend-password";
/// Keyring slot for the product-search API key.
pub const SEARCH_API_KEY: &str = "search-api-key";

/// Store a named secret in the system keyring via Secret Service.
pub async fn store_secret(slot: &str, secret: &str) -> Result<(), String> {
    let keyring = oo7::Keyring::new()
        .await
        .map_err(|e| format!("Failed to connect to keyring: {}", e))?;

    let mut attrs = HashMap::new();
    attrs.insert("service", SERVICE_NAME);
    attrs.insert("slot", slot);

    keyring
        .create_item(
            &format!("Cesto ({})", slot),
            &attrs,
            secret.as_bytes(),
            true, // replace existing
        )
        .await
        .map_err(|e| format!("Failed to store secret: {}", e))?;

    Ok(())
}

/// Load a named secret from the system keyring.
pub async fn load_secret(slot: &str) -> Result<Option<String>, String> {
    let keyring = oo7::Keyring::new()
        .await
        .map_err(|e| format!("Failed to connect to keyring: {}", e))?;

    let mut attrs = HashMap::new();
    attrs.insert("service", SERVICE_NAME);
    attrs.insert("slot", slot);

    let items = keyring
        .search_items(&attrs)
        .await
        .map_err(|e| format!("Failed to search keyring: {}", e))?;

    if let Some(item) = items.first() {
        let secret_bytes = item
            .secret()
            .await
            .map_err(|e| format!("Failed to read secret: {}", e))?;
        let secret = String::from_utf8(secret_bytes.to_vec())
            .map_err(|e| format!("Invalid UTF-8 in secret: {}", e))?;
        return Ok(Some(secret));
    }

    Ok(None)
}

/// Delete a named secret from the system keyring.
pub async fn delete_secret(slot: &str) -> Result<(), String> {
    let keyring = oo7::Keyring::new()
        .await
        .map_err(|e| format!("Failed to connect to keyring: {}", e))?;

    let mut attrs = HashMap::new();
    attrs.insert("service", SERVICE_NAME);
    attrs.insert("slot", slot);

    let items = keyring
        .search_items(&attrs)
        .await
        .map_err(|e| format!("Failed to search keyring: {}", e))?;

    for item in items {
        item.delete()
            .await
            .map_err(|e| format!("Failed to delete secret: {}", e))?;
    }

    Ok(())
}
