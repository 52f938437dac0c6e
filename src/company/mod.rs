//! Yellow-pages catalog: company records, rubric dictionary, inverted indices for
//! [`CompanyCatalog::find_companies`], and the weekly open/closed timeline for
//! [`CompanyCatalog::waiting_for_open`].

pub mod route;

use crate::shared::Coordinate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown phone type `{0}`")]
    UnknownPhoneType(String),
    #[error("unknown name type `{0}`")]
    UnknownNameType(String),
    #[error("unknown working-time day `{0}`")]
    UnknownDay(String),
    #[error("company has no name of type Main")]
    MissingMainName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameType {
    Main,
    Short,
    Synonym,
}

impl NameType {
    fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "MAIN" => Ok(Self::Main),
            "SHORT" => Ok(Self::Short),
            "SYNONYM" => Ok(Self::Synonym),
            other => Err(Error::UnknownNameType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Name {
    pub value: String,
    pub kind: NameType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhoneType {
    Phone,
    Fax,
}

impl PhoneType {
    fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "PHONE" => Ok(Self::Phone),
            "FAX" => Ok(Self::Fax),
            other => Err(Error::UnknownPhoneType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Phone {
    pub kind: Option<PhoneType>,
    pub country_code: String,
    pub local_code: String,
    pub number: String,
    pub extension: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Url {
    pub value: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Address {
    pub coords: Coordinate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyStop {
    pub name: String,
    pub meters: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Day {
    Everyday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "EVERYDAY" => Ok(Self::Everyday),
            "MONDAY" => Ok(Self::Monday),
            "TUESDAY" => Ok(Self::Tuesday),
            "WEDNESDAY" => Ok(Self::Wednesday),
            "THURSDAY" => Ok(Self::Thursday),
            "FRIDAY" => Ok(Self::Friday),
            "SATURDAY" => Ok(Self::Saturday),
            "SUNDAY" => Ok(Self::Sunday),
            other => Err(Error::UnknownDay(other.to_string())),
        }
    }

    /// Monday = 0 .. Sunday = 6; `Everyday` has no single index.
    fn index(self) -> Option<i64> {
        match self {
            Day::Everyday => None,
            Day::Monday => Some(0),
            Day::Tuesday => Some(1),
            Day::Wednesday => Some(2),
            Day::Thursday => Some(3),
            Day::Friday => Some(4),
            Day::Saturday => Some(5),
            Day::Sunday => Some(6),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingTimeInterval {
    pub day: Day,
    pub minutes_from: i64,
    pub minutes_to: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkingTime {
    pub intervals: Vec<WorkingTimeInterval>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub names: Vec<Name>,
    pub phones: Vec<Phone>,
    pub urls: Vec<Url>,
    pub rubrics: Vec<u64>,
    pub address: Address,
    pub nearby_stops: Vec<NearbyStop>,
    pub working_time: WorkingTime,
}

impl Company {
    /// The canonical name: the one `Name` of type `Main`.
    pub fn main_name(&self) -> Result<&str, Error> {
        self.names
            .iter()
            .find(|n| n.kind == NameType::Main)
            .map(|n| n.value.as_str())
            .ok_or(Error::MissingMainName)
    }

    /// The first rubric name, resolved through `rubrics`, or an empty string if the company has
    /// none — used as the prefix of its rendered map label.
    pub fn first_rubric_name<'a>(&self, rubrics: &'a HashMap<u64, String>) -> &'a str {
        self.rubrics
            .first()
            .and_then(|id| rubrics.get(id))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// One non-empty filter group in a [`CompanyCatalog::find_companies`] query. Phone matching
/// follows `DoesPhoneMatch`: an unset filter field matches anything, a set one must match exactly
/// (local_code is compared once either local_code or country_code is set).
#[derive(Debug, Clone, Default)]
pub struct PhoneQuery {
    pub kind: Option<PhoneType>,
    pub country_code: String,
    pub local_code: String,
    pub number: String,
    pub extension: String,
}

#[derive(Debug, Clone, Default)]
pub struct CompanyFilter {
    pub names: Vec<String>,
    pub rubrics: Vec<String>,
    pub urls: Vec<String>,
    pub phones: Vec<PhoneQuery>,
}

/// The weekly open/closed timeline: alternating minute-of-week offsets, even index = opens,
/// odd index = closes. Empty means "always open".
type Timeline = Vec<i64>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyCatalog {
    pub rubrics: HashMap<u64, String>,
    pub companies: Vec<Company>,
    by_names: HashMap<String, HashSet<usize>>,
    by_phone_numbers: HashMap<String, HashSet<usize>>,
    by_rubrics: HashMap<String, HashSet<usize>>,
    by_urls: HashMap<String, HashSet<usize>>,
    timelines: HashMap<String, Timeline>,
}

impl CompanyCatalog {
    pub fn build(
        rubrics: HashMap<u64, String>,
        companies: Vec<Company>,
    ) -> Result<Self, Error> {
        let mut catalog = Self {
            rubrics,
            companies,
            by_names: HashMap::new(),
            by_phone_numbers: HashMap::new(),
            by_rubrics: HashMap::new(),
            by_urls: HashMap::new(),
            timelines: HashMap::new(),
        };
        catalog.distribute()?;
        catalog.compute_working_time()?;
        Ok(catalog)
    }

    fn distribute(&mut self) -> Result<(), Error> {
        for (index, company) in self.companies.iter().enumerate() {
            for name in &company.names {
                self.by_names.entry(name.value.clone()).or_default().insert(index);
            }
            for phone in &company.phones {
                self.by_phone_numbers
                    .entry(phone.number.clone())
                    .or_default()
                    .insert(index);
            }
            for rubric_id in &company.rubrics {
                if let Some(name) = self.rubrics.get(rubric_id) {
                    self.by_rubrics.entry(name.clone()).or_default().insert(index);
                }
            }
            for url in &company.urls {
                self.by_urls.entry(url.value.clone()).or_default().insert(index);
            }
        }
        Ok(())
    }

    fn compute_working_time(&mut self) -> Result<(), Error> {
        for company in &self.companies {
            let name = company.main_name()?.to_string();
            let mut timeline: Timeline = Vec::new();
            for interval in &company.working_time.intervals {
                match interval.day.index() {
                    None => {
                        for day in 0..7 {
                            timeline.push(day * crate::shared::MINUTES_PER_DAY + interval.minutes_from);
                            timeline.push(day * crate::shared::MINUTES_PER_DAY + interval.minutes_to);
                        }
                    }
                    Some(day) => {
                        timeline.push(day * crate::shared::MINUTES_PER_DAY + interval.minutes_from);
                        timeline.push(day * crate::shared::MINUTES_PER_DAY + interval.minutes_to);
                    }
                }
            }
            timeline.sort_unstable();
            self.timelines.insert(name, timeline);
        }
        Ok(())
    }

    fn does_phone_match(query: &PhoneQuery, phone: &Phone) -> bool {
        if !query.extension.is_empty() && query.extension != phone.extension {
            return false;
        }
        if let Some(kind) = query.kind {
            if Some(kind) != phone.kind {
                return false;
            }
        }
        if !query.country_code.is_empty() && query.country_code != phone.country_code {
            return false;
        }
        if (!query.local_code.is_empty() || !query.country_code.is_empty())
            && query.local_code != phone.local_code
        {
            return false;
        }
        query.number == phone.number
    }

    /// Matching companies for a filter, by index into `self.companies`. Empty groups are
    /// skipped; groups are intersected in the order names, rubrics, urls, phones.
    pub fn find_companies(&self, filter: &CompanyFilter) -> Vec<&Company> {
        let mut result: Option<HashSet<usize>> = None;

        if !filter.names.is_empty() {
            let matched = Self::union_index(&self.by_names, &filter.names);
            if matched.is_empty() {
                return Vec::new();
            }
            result = Some(matched);
        }

        if !filter.rubrics.is_empty() {
            let matched = Self::union_index(&self.by_rubrics, &filter.rubrics);
            result = Some(Self::narrow(result, matched));
            if result.as_ref().is_some_and(HashSet::is_empty) {
                return Vec::new();
            }
        }

        if !filter.urls.is_empty() {
            let matched = Self::union_index(&self.by_urls, &filter.urls);
            result = Some(Self::narrow(result, matched));
            if result.as_ref().is_some_and(HashSet::is_empty) {
                return Vec::new();
            }
        }

        if !filter.phones.is_empty() {
            let mut matched = HashSet::new();
            for query_phone in &filter.phones {
                let Some(candidates) = self.by_phone_numbers.get(&query_phone.number) else {
                    continue;
                };
                for &index in candidates {
                    if self.companies[index]
                        .phones
                        .iter()
                        .any(|phone| Self::does_phone_match(query_phone, phone))
                    {
                        matched.insert(index);
                    }
                }
            }
            result = Some(Self::narrow(result, matched));
            if result.as_ref().is_some_and(HashSet::is_empty) {
                return Vec::new();
            }
        }

        match result {
            Some(indices) => indices.iter().map(|&i| &self.companies[i]).collect(),
            None => Vec::new(),
        }
    }

    fn union_index(index: &HashMap<String, HashSet<usize>>, keys: &[String]) -> HashSet<usize> {
        let mut union = HashSet::new();
        for key in keys {
            if let Some(set) = index.get(key) {
                union.extend(set.iter().copied());
            }
        }
        union
    }

    fn narrow(accumulated: Option<HashSet<usize>>, next: HashSet<usize>) -> HashSet<usize> {
        match accumulated {
            Some(existing) => existing.intersection(&next).copied().collect(),
            None => next,
        }
    }

    /// Minutes until `company` next opens, given the current minute-of-week `t`. Zero if already
    /// open (or if the company has no schedule at all).
    pub fn waiting_for_open(&self, t: f64, company_name: &str) -> f64 {
        let Some(timeline) = self.timelines.get(company_name) else {
            return 0.0;
        };
        if timeline.is_empty() {
            return 0.0;
        }
        let t_int = t as i64;
        match timeline.iter().position(|&edge| edge > t_int) {
            None => (timeline[0] + crate::shared::MINUTES_PER_WEEK) as f64 - t,
            Some(0) => timeline[0] as f64 - t,
            Some(next_index) => {
                if (next_index - 1) % 2 == 0 {
                    0.0
                } else {
                    timeline[next_index] as f64 - t
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_mon_tue_9_to_12() -> CompanyCatalog {
        let company = Company {
            names: vec![Name {
                value: "Cafe".into(),
                kind: NameType::Main,
            }],
            phones: vec![],
            urls: vec![],
            rubrics: vec![],
            address: Address::default(),
            nearby_stops: vec![],
            working_time: WorkingTime {
                intervals: vec![
                    WorkingTimeInterval {
                        day: Day::Monday,
                        minutes_from: 540,
                        minutes_to: 720,
                    },
                    WorkingTimeInterval {
                        day: Day::Tuesday,
                        minutes_from: 540,
                        minutes_to: 720,
                    },
                ],
            },
        };
        CompanyCatalog::build(HashMap::new(), vec![company]).unwrap()
    }

    #[test]
    fn waiting_for_open_matches_spec_example() {
        let catalog = open_mon_tue_9_to_12();
        assert_eq!(catalog.waiting_for_open(600.0, "Cafe"), 0.0);
        assert_eq!(catalog.waiting_for_open(800.0, "Cafe"), 1180.0);
        assert_eq!(catalog.waiting_for_open(10000.0, "Cafe"), 620.0);
    }

    #[test]
    fn empty_timeline_is_always_open() {
        let company = Company {
            names: vec![Name {
                value: "Always".into(),
                kind: NameType::Main,
            }],
            phones: vec![],
            urls: vec![],
            rubrics: vec![],
            address: Address::default(),
            nearby_stops: vec![],
            working_time: WorkingTime::default(),
        };
        let catalog = CompanyCatalog::build(HashMap::new(), vec![company]).unwrap();
        assert_eq!(catalog.waiting_for_open(4000.0, "Always"), 0.0);
    }

    #[test]
    fn find_companies_intersects_groups_in_order() {
        let mut rubrics = HashMap::new();
        rubrics.insert(1, "Food".to_string());
        let a = Company {
            names: vec![Name {
                value: "A".into(),
                kind: NameType::Main,
            }],
            phones: vec![],
            urls: vec![Url { value: "x.com".into() }],
            rubrics: vec![1],
            address: Address::default(),
            nearby_stops: vec![],
            working_time: WorkingTime::default(),
        };
        let b = Company {
            names: vec![Name {
                value: "B".into(),
                kind: NameType::Main,
            }],
            phones: vec![],
            urls: vec![Url { value: "y.com".into() }],
            rubrics: vec![1],
            address: Address::default(),
            nearby_stops: vec![],
            working_time: WorkingTime::default(),
        };
        let catalog = CompanyCatalog::build(rubrics, vec![a, b]).unwrap();
        let filter = CompanyFilter {
            rubrics: vec!["Food".to_string()],
            urls: vec!["x.com".to_string()],
            ..Default::default()
        };
        let matches = catalog.find_companies(&filter);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].main_name().unwrap(), "A");
    }

    #[test]
    fn phone_match_requires_local_code_once_country_code_set() {
        let phone = Phone {
            kind: Some(PhoneType::Phone),
            country_code: "7".into(),
            local_code: "495".into(),
            number: "1234567".into(),
            extension: String::new(),
        };
        let matching_query = PhoneQuery {
            country_code: "7".into(),
            local_code: "495".into(),
            number: "1234567".into(),
            ..Default::default()
        };
        assert!(CompanyCatalog::does_phone_match(&matching_query, &phone));

        let wrong_local_code = PhoneQuery {
            country_code: "7".into(),
            local_code: "812".into(),
            number: "1234567".into(),
            ..Default::default()
        };
        assert!(!CompanyCatalog::does_phone_match(&wrong_local_code, &phone));
    }
}
