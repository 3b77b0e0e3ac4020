use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Last-resort source of node addresses: a human at the terminal.
#[allow(async_fn_in_trait)]
pub trait OperatorPrompt {
    /// Ask for a comma-separated address list. `None` if nothing could be read.
    async fn ask_addresses(&mut self) -> Option<String>;
}

/// Prompts on stderr and reads a single line from stdin.
pub struct StdinPrompt;

impl OperatorPrompt for StdinPrompt {
    async fn ask_addresses(&mut self) -> Option<String> {
        let mut stderr = tokio::io::stderr();
        stderr
            .write_all(b"No public node address found. Enter node addresses, comma separated: ")
            .await
            .ok()?;
        stderr.flush().await.ok()?;

        let mut line = String::new();
        match BufReader::new(tokio::io::stdin()).read_line(&mut line).await {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    }
}

/// Splits on commas, trims, drops empty entries.
pub fn parse_manual_addresses(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_drops_empty_entries() {
        assert_eq!(
            parse_manual_addresses(" 1.1.1.1, ,2.2.2.2 ,\n"),
            vec!["1.1.1.1", "2.2.2.2"]
        );
    }

    #[test]
    fn blank_input_yields_nothing() {
        assert!(parse_manual_addresses("   \n").is_empty());
        assert!(parse_manual_addresses(",,").is_empty());
    }
}
