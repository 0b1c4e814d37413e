//! Page and statistics query state: filters, pagination, stats parameters.

use crate::collections::{CollectionId, CollectionKind};

/// Fixed server page size. A full page is the only trusted continuation
/// signal; `total_count` is display-only and never gates pagination.
pub const PAGE_SIZE: usize = 50;

/// Dates travel as ISO `YYYY-MM-DD` strings; the core never interprets them.
pub type IsoDate = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QualityFilter {
    #[default]
    Any,
    Good,
    Banned,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SexFilter {
    #[default]
    Any,
    Female,
    Male,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnlineRecency {
    #[default]
    Any,
    Today,
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanMessage {
    #[default]
    Any,
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlatformFilter {
    #[default]
    Any,
    Mobile,
    Desktop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgeBracket {
    #[default]
    Any,
    Under18,
    From18To24,
    From25To34,
    From35To44,
    Over45,
}

/// The fixed record of independent filter dimensions. Which subset is
/// meaningful depends on the collection kind; the unused dimensions are
/// simply not serialized into the query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filters {
    pub quality: QualityFilter,
    pub sex: SexFilter,
    pub online: OnlineRecency,
    pub can_message: CanMessage,
    pub birth_month: Option<u8>,
    pub platform: PlatformFilter,
    pub age: AgeBracket,
}

/// A single-dimension filter change, as dispatched by the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterUpdate {
    Quality(QualityFilter),
    Sex(SexFilter),
    Online(OnlineRecency),
    CanMessage(CanMessage),
    BirthMonth(Option<u8>),
    Platform(PlatformFilter),
    Age(AgeBracket),
}

impl Filters {
    pub fn apply(&mut self, update: FilterUpdate) {
        match update {
            FilterUpdate::Quality(v) => self.quality = v,
            FilterUpdate::Sex(v) => self.sex = v,
            FilterUpdate::Online(v) => self.online = v,
            FilterUpdate::CanMessage(v) => self.can_message = v,
            FilterUpdate::BirthMonth(v) => self.birth_month = v,
            FilterUpdate::Platform(v) => self.platform = v,
            FilterUpdate::Age(v) => self.age = v,
        }
    }
}

/// The filter payload a page fetch actually carries, routed by collection
/// kind: membership queries take the full record, interaction queries a
/// restricted subset, content queries only the search text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryShape {
    Membership(Filters),
    Content,
    Interaction { platform: PlatformFilter },
}

impl QueryShape {
    pub fn for_collection(collection: CollectionId, filters: &Filters) -> QueryShape {
        match collection.kind() {
            CollectionKind::Membership => QueryShape::Membership(filters.clone()),
            CollectionKind::Content => QueryShape::Content,
            CollectionKind::Interaction => QueryShape::Interaction {
                platform: filters.platform,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatsPeriod {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
    All,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatsGroupBy {
    #[default]
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl StatsPeriod {
    /// The grouping granularities a period admits.
    pub fn allowed_group_bys(self) -> &'static [StatsGroupBy] {
        match self {
            StatsPeriod::Week => &[StatsGroupBy::Day],
            StatsPeriod::Month => &[StatsGroupBy::Day, StatsGroupBy::Week],
            StatsPeriod::Quarter => &[StatsGroupBy::Day, StatsGroupBy::Week, StatsGroupBy::Month],
            StatsPeriod::Year => &[StatsGroupBy::Week, StatsGroupBy::Month, StatsGroupBy::Quarter],
            StatsPeriod::All | StatsPeriod::Custom => &[
                StatsGroupBy::Day,
                StatsGroupBy::Week,
                StatsGroupBy::Month,
                StatsGroupBy::Quarter,
                StatsGroupBy::Year,
            ],
        }
    }

    /// Deterministic fallback grouping when a period change invalidates the
    /// current one.
    pub fn fallback_group_by(self) -> StatsGroupBy {
        match self {
            StatsPeriod::Week | StatsPeriod::Month => StatsGroupBy::Day,
            StatsPeriod::Quarter => StatsGroupBy::Week,
            StatsPeriod::Year => StatsGroupBy::Month,
            StatsPeriod::All | StatsPeriod::Custom => StatsGroupBy::Month,
        }
    }
}

/// Parameters of a statistics fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsQuery {
    pub period: StatsPeriod,
    pub group_by: StatsGroupBy,
    pub date_from: Option<IsoDate>,
    pub date_to: Option<IsoDate>,
    pub can_write: Option<bool>,
}

impl StatsQuery {
    /// Changes the period, remapping the grouping if it is no longer valid.
    pub fn set_period(&mut self, period: StatsPeriod) {
        self.period = period;
        if !period.allowed_group_bys().contains(&self.group_by) {
            self.group_by = period.fallback_group_by();
        }
    }

    /// Changes the grouping; invalid combinations are ignored.
    pub fn set_group_by(&mut self, group_by: StatsGroupBy) {
        if self.period.allowed_group_bys().contains(&group_by) {
            self.group_by = group_by;
        }
    }

    /// A custom period may not fire a fetch until both bounds are set.
    pub fn is_ready(&self) -> bool {
        self.period != StatsPeriod::Custom || (self.date_from.is_some() && self.date_to.is_some())
    }
}

/// One bucket of a statistics series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsBucket {
    pub label: String,
    pub count: u64,
}

/// The opaque-enough statistics payload the store holds for display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub buckets: Vec<StatsBucket>,
}
