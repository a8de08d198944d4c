//! Output formatting helpers for the CLI.

/// Print names one per line, or as a JSON array.
pub fn print_list(items: &[String], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else {
        for item in items {
            println!("{}", item);
        }
    }
    Ok(())
}

pub fn print_count(namespace: &str, count: usize, json: bool) -> anyhow::Result<()> {
    if json {
        let value = serde_json::json!({
            "namespace": namespace,
            "count": count,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", count);
    }
    Ok(())
}

/// Print a stored payload verbatim, or wrapped with its key as JSON.
pub fn print_payload(namespace: &str, key: &str, payload: &str, json: bool) -> anyhow::Result<()> {
    if json {
        let value: serde_json::Value = serde_json::from_str(payload)?;
        let wrapped = serde_json::json!({
            "namespace": namespace,
            "key": key,
            "value": value,
        });
        println!("{}", serde_json::to_string_pretty(&wrapped)?);
    } else {
        println!("{}", payload);
    }
    Ok(())
}
