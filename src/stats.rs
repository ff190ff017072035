use crate::participant::ParticipantView;

/// Aggregates shown above the participant list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total: usize,
    pub active_count: usize,
    pub average_progress: u32,
}

impl Stats {
    pub fn compute(participants: &[ParticipantView]) -> Self {
        Self {
            total: participants.len(),
            active_count: active_count(participants),
            average_progress: average_progress(participants),
        }
    }
}

pub fn active_count(participants: &[ParticipantView]) -> usize {
    participants
        .iter()
        .filter(|participant| participant.is_online)
        .count()
}

/// Mean progress over everyone, online or not, rounded to the
/// nearest percent. Zero for an empty list
pub fn average_progress(participants: &[ParticipantView]) -> u32 {
    if participants.is_empty() {
        return 0;
    }
    let sum: u64 = participants
        .iter()
        .map(|participant| u64::from(participant.progress))
        .sum();
    (sum as f64 / participants.len() as f64).round() as u32
}

#[cfg(test)]
mod test {
    use crate::participant::ParticipantView;
    use crate::stats::{active_count, average_progress, Stats};

    fn view(progress: u32, is_online: bool) -> ParticipantView {
        ParticipantView {
            id: format!("p{progress}"),
            name: format!("Participant {progress}"),
            progress,
            last_active: String::new(),
            badges: Vec::new(),
            is_online,
        }
    }

    #[test]
    fn averages_progress() {
        let views = vec![view(0, false), view(50, true), view(100, false)];
        assert_eq!(average_progress(&views), 50);
        assert_eq!(average_progress(&[]), 0);

        // 5 + 10 = 15 / 2 = 7.5
        assert_eq!(average_progress(&[view(5, true), view(10, true)]), 8);
    }

    #[test]
    fn counts_online_participants() {
        let views = vec![view(10, true), view(20, false), view(30, true)];
        assert_eq!(active_count(&views), 2);
        assert_eq!(
            Stats::compute(&views),
            Stats {
                total: 3,
                active_count: 2,
                average_progress: 20,
            }
        );
    }
}
