//! Snapshot diff - newly appeared titles between two snapshots of a feed
//!
//! Titles are compared under the key `(client_code, invoice_number)`. When a
//! previous snapshot with titles exists but nothing is new, the result is
//! the union of both snapshots instead of an empty set, and `used_fallback`
//! says so. Callers filter the result further (e.g. by due date).

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ledger::Snapshot;
use super::title::{LedgerDate, Title};

/// Identity of a title across snapshots
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TitleKey {
    pub client_code: String,
    pub invoice_number: String,
}

impl TitleKey {
    pub fn new(client_code: &str, title: &Title) -> Self {
        Self {
            client_code: client_code.to_string(),
            invoice_number: title.invoice_number.clone(),
        }
    }
}

/// Which snapshot a reported title was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleOrigin {
    Current,
    Previous,
}

impl TitleOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            TitleOrigin::Current => "current",
            TitleOrigin::Previous => "previous",
        }
    }
}

/// A title with its owning client's context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffTitle {
    pub client_code: String,
    pub client_name: String,
    pub origin: TitleOrigin,
    #[serde(flatten)]
    pub title: Title,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffResult {
    /// New titles, or the union of both snapshots when `used_fallback`
    pub titles: Vec<DiffTitle>,
    pub used_fallback: bool,
    /// Whether a previous snapshot took part in the comparison
    pub had_previous: bool,
    /// Titles whose key is absent from the previous snapshot
    pub new_count: usize,
}

/// Compare the newest snapshot of a feed with the one before it
pub fn diff_snapshots(previous: Option<&Snapshot>, current: &Snapshot) -> DiffResult {
    let Some(previous) = previous else {
        let titles = collect(current, TitleOrigin::Current, |_| true);
        let new_count = titles.len();
        return DiffResult {
            titles,
            used_fallback: false,
            had_previous: false,
            new_count,
        };
    };

    let known: HashSet<TitleKey> = previous
        .titles()
        .map(|(client, title)| TitleKey::new(&client.client_code, title))
        .collect();

    let new_titles = collect(current, TitleOrigin::Current, |key| !known.contains(key));
    let new_count = new_titles.len();

    if !new_titles.is_empty() || previous.has_no_titles() {
        return DiffResult {
            titles: new_titles,
            used_fallback: false,
            had_previous: true,
            new_count,
        };
    }

    DiffResult {
        titles: union(current, previous),
        used_fallback: true,
        had_previous: true,
        new_count: 0,
    }
}

fn collect(
    snapshot: &Snapshot,
    origin: TitleOrigin,
    keep: impl Fn(&TitleKey) -> bool,
) -> Vec<DiffTitle> {
    snapshot
        .titles()
        .filter(|(client, title)| keep(&TitleKey::new(&client.client_code, title)))
        .map(|(client, title)| DiffTitle {
            client_code: client.client_code.clone(),
            client_name: client.client_name.clone(),
            origin,
            title: title.clone(),
        })
        .collect()
}

/// Current titles first, then previous titles not already present verbatim
fn union(current: &Snapshot, previous: &Snapshot) -> Vec<DiffTitle> {
    let mut seen: HashSet<(String, Title)> = HashSet::new();
    let mut titles = Vec::new();

    let sides = [
        (current, TitleOrigin::Current),
        (previous, TitleOrigin::Previous),
    ];
    for (snapshot, origin) in sides {
        for (client, title) in snapshot.titles() {
            if seen.insert((client.client_code.clone(), title.clone())) {
                titles.push(DiffTitle {
                    client_code: client.client_code.clone(),
                    client_name: client.client_name.clone(),
                    origin,
                    title: title.clone(),
                });
            }
        }
    }

    titles
}

/// Due-date window a consumer applies on top of a diff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DueDateFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DueDateFilter {
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Unknown due dates only pass an unbounded filter
    pub fn matches(&self, due: &LedgerDate) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(date) = due.as_date() else {
            return false;
        };
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }

    pub fn apply<'a>(&self, titles: &'a [DiffTitle]) -> Vec<&'a DiffTitle> {
        titles
            .iter()
            .filter(|t| self.matches(&t.title.due_date))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::ClientLedgerEntry;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn title(invoice: &str, due: Option<(i32, u32, u32)>) -> Title {
        Title {
            due_date: due
                .and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
                .map(LedgerDate::Known)
                .unwrap_or(LedgerDate::Unknown),
            issue_date: LedgerDate::Unknown,
            invoice_number: invoice.to_string(),
            payment_type: "DB".to_string(),
            payment_condition: "DEPOSITO BANCARIO".to_string(),
            days_overdue: 3,
            total_value: Decimal::new(1000, 2),
            paid_value: Decimal::ZERO,
            pending_value: Decimal::new(1000, 2),
        }
    }

    fn snapshot(clients: Vec<(&str, Vec<&str>)>) -> Snapshot {
        let entries = clients
            .into_iter()
            .map(|(code, invoices)| {
                let mut entry = ClientLedgerEntry::new(code, format!("CLIENT {}", code));
                for inv in invoices {
                    entry.push_title(title(inv, None));
                }
                entry
            })
            .collect();
        Snapshot::new("feed", Utc::now(), "hash", entries)
    }

    #[test]
    fn test_first_upload_reports_everything() {
        let current = snapshot(vec![("39", vec!["1", "2"]), ("40", vec!["3"])]);
        let diff = diff_snapshots(None, &current);

        assert_eq!(diff.titles.len(), 3);
        assert_eq!(diff.new_count, 3);
        assert!(!diff.used_fallback);
        assert!(!diff.had_previous);
    }

    #[test]
    fn test_key_is_per_client() {
        // Same invoice number under another client is a different title
        let previous = snapshot(vec![("39", vec!["100"])]);
        let current = snapshot(vec![("39", vec!["100"]), ("40", vec!["100"])]);
        let diff = diff_snapshots(Some(&previous), &current);

        assert!(!diff.used_fallback);
        assert_eq!(diff.titles.len(), 1);
        assert_eq!(diff.titles[0].client_code, "40");
    }

    #[test]
    fn test_fallback_unions_both_sides() {
        let previous = snapshot(vec![("39", vec!["1", "2"])]);
        let current = snapshot(vec![("39", vec!["1"])]);
        let diff = diff_snapshots(Some(&previous), &current);

        assert!(diff.used_fallback);
        assert_eq!(diff.new_count, 0);
        let invoices: Vec<_> = diff.titles.iter().map(|t| t.title.invoice_number.as_str()).collect();
        assert_eq!(invoices, vec!["1", "2"]);
        assert_eq!(diff.titles[0].origin, TitleOrigin::Current);
        assert_eq!(diff.titles[1].origin, TitleOrigin::Previous);
    }

    #[test]
    fn test_no_fallback_when_previous_has_no_titles() {
        let previous = snapshot(vec![("39", vec![])]);
        let current = snapshot(vec![("39", vec![])]);
        let diff = diff_snapshots(Some(&previous), &current);

        assert!(!diff.used_fallback);
        assert!(diff.titles.is_empty());
    }

    #[test]
    fn test_due_date_filter() {
        let filter = DueDateFilter {
            from: NaiveDate::from_ymd_opt(2026, 1, 1),
            to: NaiveDate::from_ymd_opt(2026, 1, 31),
        };
        assert!(filter.matches(&title("1", Some((2026, 1, 23))).due_date));
        assert!(!filter.matches(&title("1", Some((2026, 2, 1))).due_date));
        assert!(!filter.matches(&LedgerDate::Unknown));
        assert!(DueDateFilter::default().matches(&LedgerDate::Unknown));
    }
}
