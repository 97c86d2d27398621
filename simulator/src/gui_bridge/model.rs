use fleetcore::engine::Notice;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const NOTICE_HISTORY: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectRequest {
    pub reg_no: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Most recent operator notices, oldest first.
#[derive(Debug, Default)]
pub struct NoticeLog {
    entries: VecDeque<Notice>,
}

impl NoticeLog {
    pub fn push(&mut self, notice: Notice) {
        if self.entries.len() == NOTICE_HISTORY {
            self.entries.pop_front();
        }
        self.entries.push_back(notice);
    }

    pub fn snapshot(&self) -> Vec<Notice> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_log_is_bounded() {
        let mut log = NoticeLog::default();
        for i in 0..(NOTICE_HISTORY + 5) {
            log.push(Notice::SelectionRejected {
                vehicle: format!("V-{}", i).into(),
                message: "in maintenance".into(),
            });
        }
        assert_eq!(log.snapshot().len(), NOTICE_HISTORY);
        match &log.snapshot()[0] {
            Notice::SelectionRejected { vehicle, .. } => assert_eq!(vehicle.as_str(), "V-5"),
            other => panic!("unexpected notice {:?}", other),
        }
    }
}
