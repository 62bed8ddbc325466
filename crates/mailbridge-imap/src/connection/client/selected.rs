//! Implementation for the selected state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::Selected;
use crate::Result;
use crate::command::{Command, FetchAttribute};
use crate::parser::{FetchItem, Response, ResponseParser, UntaggedResponse};
use crate::types::{SeqNum, SequenceSet};

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Searches the selected mailbox.
    ///
    /// Returns matching sequence numbers in the order the server sent them.
    pub async fn search(&mut self, criteria: &str) -> Result<Vec<SeqNum>> {
        let cmd = Command::Search {
            criteria: criteria.to_string(),
        };
        let responses = self.execute(&cmd).await?;

        let mut results = Vec::new();
        for response_bytes in &responses {
            if let Ok(Response::Untagged(UntaggedResponse::Search(ids))) =
                ResponseParser::parse(response_bytes)
            {
                results.extend(ids);
            }
        }
        Ok(results)
    }

    /// Fetches message data for the given sequence set.
    ///
    /// Returns a vector of (sequence number, fetch items) pairs.
    pub async fn fetch(
        &mut self,
        sequence: &SequenceSet,
        items: &[FetchAttribute],
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        let cmd = Command::Fetch {
            sequence: sequence.clone(),
            items: items.to_vec(),
        };
        let responses = self.execute(&cmd).await?;

        let mut results = Vec::new();
        for response_bytes in &responses {
            if let Response::Untagged(UntaggedResponse::Fetch { seq, items }) =
                ResponseParser::parse(response_bytes)?
            {
                results.push((seq, items));
            }
        }
        Ok(results)
    }
}
