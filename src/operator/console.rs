//! Terminal operator.

use async_trait::async_trait;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines, Stdin, Stdout,
};
use tokio::sync::Mutex;

use crate::error::RelayError;
use crate::net::ConnectionId;
use crate::operator::Operator;

struct Terminal<R, W> {
    input: Lines<BufReader<R>>,
    output: W,
}

/// Prompts on stdout and reads one line per message from stdin.
///
/// Sessions share the terminal, so every prompt and notice holds it for the
/// whole exchange. A notice waits for a pending prompt to be answered.
pub struct ConsoleOperator<R = Stdin, W = Stdout> {
    terminal: Mutex<Terminal<R, W>>,
}

impl ConsoleOperator {
    pub fn new() -> Self {
        Self::with_io(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl Default for ConsoleOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, W> ConsoleOperator<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn with_io(input: R, output: W) -> Self {
        Self {
            terminal: Mutex::new(Terminal {
                input: BufReader::new(input).lines(),
                output,
            }),
        }
    }

    async fn notify(&self, session: ConnectionId, line: String) {
        let mut terminal = self.terminal.lock().await;
        let written = async {
            terminal.output.write_all(line.as_bytes()).await?;
            terminal.output.flush().await
        }
        .await;
        if let Err(e) = written {
            tracing::warn!(connection_id = %session, error = %e, "Failed to write to terminal");
        }
    }
}

#[async_trait]
impl<R, W> Operator for ConsoleOperator<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn compose(&self, session: ConnectionId) -> Result<Vec<u8>, RelayError> {
        let mut terminal = self.terminal.lock().await;

        terminal.output.write_all(b"Enter message to send: ").await?;
        terminal.output.flush().await?;

        match terminal.input.next_line().await? {
            Some(line) => {
                tracing::debug!(connection_id = %session, bytes = line.len(), "Operator message read");
                Ok(line.into_bytes())
            }
            None => Err(RelayError::OperatorClosed),
        }
    }

    async fn deliver(&self, session: ConnectionId, message: &[u8]) {
        let line = format!("Received message: {}\n", String::from_utf8_lossy(message));
        self.notify(session, line).await;
    }

    async fn awaiting_carrier(&self, session: ConnectionId, remaining_bits: usize) {
        let line = format!(
            "{} bits remaining; please send additional request.\n",
            remaining_bits
        );
        self.notify(session, line).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn output_of(operator: ConsoleOperator<&'static [u8], Vec<u8>>) -> String {
        String::from_utf8(operator.terminal.into_inner().output).unwrap()
    }

    #[tokio::test]
    async fn compose_prompts_and_reads_one_line() {
        let operator = ConsoleOperator::with_io(&b"meet at dawn\nsecond\n"[..], Vec::new());
        let id = ConnectionId::new();

        assert_eq!(operator.compose(id).await.unwrap(), b"meet at dawn".to_vec());
        assert_eq!(operator.compose(id).await.unwrap(), b"second".to_vec());
        assert!(matches!(
            operator.compose(id).await,
            Err(RelayError::OperatorClosed)
        ));
        assert_eq!(
            output_of(operator),
            "Enter message to send: Enter message to send: Enter message to send: "
        );
    }

    #[tokio::test]
    async fn notices_never_split_a_prompt() {
        let operator = Arc::new(ConsoleOperator::with_io(&b"reply\n"[..], Vec::new()));
        let id = ConnectionId::new();

        let composing = operator.terminal.lock().await;
        let delivering = {
            let operator = Arc::clone(&operator);
            tokio::spawn(async move { operator.deliver(id, b"hello").await })
        };
        tokio::task::yield_now().await;
        assert!(!delivering.is_finished());
        drop(composing);

        assert_eq!(operator.compose(id).await.unwrap(), b"reply".to_vec());
        delivering.await.unwrap();
        operator.awaiting_carrier(id, 12).await;

        let operator = Arc::try_unwrap(operator).ok().unwrap();
        let received = "Received message: hello\n";
        let prompt = "Enter message to send: ";
        let carrier = "12 bits remaining; please send additional request.\n";
        let output = output_of(operator);
        assert!(
            output == format!("{received}{prompt}{carrier}")
                || output == format!("{prompt}{received}{carrier}"),
            "{output:?}"
        );
    }
}
