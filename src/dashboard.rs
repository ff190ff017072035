use crate::participant::ParticipantView;
use crate::poll::FeedState;
use crate::stats::Stats;

/// View state of the dashboard: the latest feed plus the search query
#[derive(Debug, Default, Clone)]
pub struct Dashboard {
    feed: FeedState,
    query: String,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the feed wholesale with the latest poll result
    pub fn update(&mut self, feed: FeedState) {
        self.feed = feed;
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn connected(&self) -> bool {
        self.feed.connected
    }

    pub fn error(&self) -> Option<&str> {
        self.feed.error.as_deref()
    }

    pub fn participants(&self) -> &[ParticipantView] {
        &self.feed.participants
    }

    /// Participants whose name contains the query, ignoring case
    pub fn visible(&self) -> Vec<&ParticipantView> {
        filter_by_name(&self.feed.participants, &self.query)
    }

    /// Aggregates over every participant, not just the visible ones
    pub fn stats(&self) -> Stats {
        Stats::compute(&self.feed.participants)
    }
}

pub fn filter_by_name<'a>(participants: &'a [ParticipantView], query: &str) -> Vec<&'a ParticipantView> {
    let query = query.to_lowercase();
    participants
        .iter()
        .filter(|participant| participant.name.to_lowercase().contains(&query))
        .collect()
}

#[cfg(test)]
mod test {
    use crate::client::FetchError;
    use crate::dashboard::Dashboard;
    use crate::participant::ParticipantView;
    use crate::poll::FeedState;

    fn view(name: &str, progress: u32, is_online: bool) -> ParticipantView {
        ParticipantView {
            id: name.to_lowercase(),
            name: name.to_string(),
            progress,
            last_active: "10:00:00 AM".to_string(),
            badges: Vec::new(),
            is_online,
        }
    }

    fn connected_feed() -> FeedState {
        FeedState {
            participants: vec![view("Ana", 0, true), view("Bob", 50, false), view("Mariana", 100, true)],
            connected: true,
            error: None,
        }
    }

    #[test]
    fn search_ignores_case() {
        let mut dashboard = Dashboard::new();
        dashboard.update(connected_feed());

        dashboard.set_query("ana");
        let names: Vec<String> = dashboard.visible().iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, vec!["Ana", "Mariana"]);

        dashboard.set_query("BOB");
        assert_eq!(dashboard.visible().len(), 1);

        dashboard.set_query("");
        assert_eq!(dashboard.visible().len(), 3);
    }

    #[test]
    fn stats_ignore_query() {
        let mut dashboard = Dashboard::new();
        dashboard.update(connected_feed());
        dashboard.set_query("bob");

        let stats = dashboard.stats();
        assert_eq!(stats.active_count, 2);
        assert_eq!(stats.average_progress, 50);
    }

    #[test]
    fn search_works_while_disconnected() {
        let mut dashboard = Dashboard::new();
        let mut feed = connected_feed();
        dashboard.update(feed.clone());

        feed.apply_failure(&FetchError::Other("connection reset".to_string()));
        dashboard.update(feed);
        dashboard.set_query("ana");

        assert!(!dashboard.connected());
        assert_eq!(dashboard.error(), Some("connection reset"));
        assert_eq!(dashboard.visible().len(), 2);
    }
}
