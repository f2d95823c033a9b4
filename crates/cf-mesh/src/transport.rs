//! Message passing between ranks.

use crate::error::{MeshError, MeshResult};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};

/// Collective all-to-all byte exchange.
///
/// Every rank calls [`Transport::exchange`] the same number of times in the
/// same order; call `k` on one rank pairs with call `k` on every other.
pub trait Transport: Send + Sync {
    fn rank(&self) -> usize;

    fn n_ranks(&self) -> usize;

    /// Send `outgoing[r]` to rank `r` and return what each rank sent here,
    /// indexed by source rank.
    fn exchange(&self, outgoing: Vec<Vec<u8>>) -> MeshResult<Vec<Vec<u8>>>;
}

/// Serial run: one rank, exchange is the identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTransport;

impl Transport for LocalTransport {
    fn rank(&self) -> usize {
        0
    }

    fn n_ranks(&self) -> usize {
        1
    }

    fn exchange(&self, outgoing: Vec<Vec<u8>>) -> MeshResult<Vec<Vec<u8>>> {
        if outgoing.len() != 1 {
            return Err(MeshError::SizeMismatch {
                what: "outgoing rank buffers".to_string(),
                expected: 1,
                actual: outgoing.len(),
            });
        }
        Ok(outgoing)
    }
}

struct Inbox {
    receiver: Receiver<(usize, Vec<u8>)>,
    // Messages that arrived early, from a rank already in its next exchange.
    pending: Vec<VecDeque<Vec<u8>>>,
}

/// In-process transport over std channels, one endpoint per rank.
///
/// Endpoints are meant to be moved onto one thread each.
pub struct ChannelTransport {
    rank: usize,
    senders: Vec<Sender<(usize, Vec<u8>)>>,
    inbox: Mutex<Inbox>,
}

impl std::fmt::Debug for ChannelTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelTransport")
            .field("rank", &self.rank)
            .field("n_ranks", &self.senders.len())
            .finish()
    }
}

impl ChannelTransport {
    /// Build a fully connected set of `n` endpoints, index = rank.
    pub fn ranks(n: usize) -> Vec<Self> {
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..n).map(|_| mpsc::channel()).unzip();
        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, receiver)| Self {
                rank,
                senders: senders.clone(),
                inbox: Mutex::new(Inbox {
                    receiver,
                    pending: vec![VecDeque::new(); n],
                }),
            })
            .collect()
    }
}

impl Transport for ChannelTransport {
    fn rank(&self) -> usize {
        self.rank
    }

    fn n_ranks(&self) -> usize {
        self.senders.len()
    }

    fn exchange(&self, outgoing: Vec<Vec<u8>>) -> MeshResult<Vec<Vec<u8>>> {
        let n = self.n_ranks();
        if outgoing.len() != n {
            return Err(MeshError::SizeMismatch {
                what: "outgoing rank buffers".to_string(),
                expected: n,
                actual: outgoing.len(),
            });
        }

        for (dest, bytes) in outgoing.into_iter().enumerate() {
            self.senders[dest]
                .send((self.rank, bytes))
                .map_err(|_| MeshError::Transport {
                    message: format!("rank {dest} hung up"),
                })?;
        }

        let mut inbox = self.inbox.lock().map_err(|_| MeshError::Transport {
            message: "inbox lock poisoned".to_string(),
        })?;
        while inbox.pending.iter().any(VecDeque::is_empty) {
            let (source, bytes) = inbox.receiver.recv().map_err(|_| MeshError::Transport {
                message: format!("rank {} lost its peers", self.rank),
            })?;
            inbox.pending[source].push_back(bytes);
        }

        let incoming = inbox
            .pending
            .iter_mut()
            .map(|queue| queue.pop_front().unwrap_or_default())
            .collect();
        tracing::trace!(rank = self.rank, n_ranks = n, "exchange complete");
        Ok(incoming)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn local_transport_is_identity() {
        let t = LocalTransport;
        assert_eq!(t.exchange(vec![vec![7]]).unwrap(), vec![vec![7]]);
        assert!(t.exchange(vec![vec![], vec![]]).is_err());
    }

    #[test]
    fn three_ranks_all_to_all() {
        let handles: Vec<_> = ChannelTransport::ranks(3)
            .into_iter()
            .map(|t| {
                thread::spawn(move || {
                    let me = t.rank() as u8;
                    // Two rounds to exercise early arrivals.
                    let mut rounds = Vec::new();
                    for round in 0..2u8 {
                        let out = (0..3u8).map(|dest| vec![me, dest, round]).collect();
                        rounds.push(t.exchange(out).unwrap());
                    }
                    (me, rounds)
                })
            })
            .collect();

        for handle in handles {
            let (me, rounds) = handle.join().unwrap();
            for (round, incoming) in rounds.into_iter().enumerate() {
                for (source, bytes) in incoming.into_iter().enumerate() {
                    assert_eq!(bytes, vec![source as u8, me, round as u8]);
                }
            }
        }
    }
}
