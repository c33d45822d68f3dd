use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Runtime and communication statistics of a single protocol run.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct RunStatistics {
    pub gates: usize,
    pub interactive_gates: usize,
    pub conversions: usize,
    pub time_setup_ms: u128,
    pub time_online_ms: u128,
    pub bytes_sent: usize,
    pub bytes_received: usize,
}

impl Display for RunStatistics {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "gates: {} (interactive: {}, conversions: {})",
            self.gates, self.interactive_gates, self.conversions
        )?;
        writeln!(
            f,
            "setup: {} ms, online: {} ms",
            self.time_setup_ms, self.time_online_ms
        )?;
        write!(
            f,
            "sent: {} bytes, received: {} bytes",
            self.bytes_sent, self.bytes_received
        )
    }
}

/// Statistics accumulated over multiple evaluation rounds.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct AccumulatedStatistics {
    pub rounds: usize,
    pub total: RunStatistics,
}

impl AccumulatedStatistics {
    pub fn add(&mut self, run: &RunStatistics) {
        self.rounds += 1;
        self.total.gates += run.gates;
        self.total.interactive_gates += run.interactive_gates;
        self.total.conversions += run.conversions;
        self.total.time_setup_ms += run.time_setup_ms;
        self.total.time_online_ms += run.time_online_ms;
        self.total.bytes_sent += run.bytes_sent;
        self.total.bytes_received += run.bytes_received;
    }

    /// Per-round mean of the accumulated totals.
    pub fn mean(&self) -> RunStatistics {
        if self.rounds == 0 {
            return RunStatistics::default();
        }
        RunStatistics {
            gates: self.total.gates / self.rounds,
            interactive_gates: self.total.interactive_gates / self.rounds,
            conversions: self.total.conversions / self.rounds,
            time_setup_ms: self.total.time_setup_ms / self.rounds as u128,
            time_online_ms: self.total.time_online_ms / self.rounds as u128,
            bytes_sent: self.total.bytes_sent / self.rounds,
            bytes_received: self.total.bytes_received / self.rounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_divides_by_round_count() {
        let mut acc = AccumulatedStatistics::default();
        for _ in 0..4 {
            acc.add(&RunStatistics {
                gates: 10,
                interactive_gates: 3,
                conversions: 1,
                time_setup_ms: 2,
                time_online_ms: 8,
                bytes_sent: 100,
                bytes_received: 100,
            });
        }
        assert_eq!(4, acc.rounds);
        assert_eq!(40, acc.total.gates);
        let mean = acc.mean();
        assert_eq!(10, mean.gates);
        assert_eq!(8, mean.time_online_ms);
    }

    #[test]
    fn mean_of_no_rounds_is_zero() {
        assert_eq!(0, AccumulatedStatistics::default().mean().gates);
    }
}
