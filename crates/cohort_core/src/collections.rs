//! The closed set of server-backed collections and their static grouping.

/// UI-level category a collection belongs to. Exactly one group per
/// collection; the mapping is a static total function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Group {
    #[default]
    Membership,
    Activity,
    Automation,
    Other,
}

/// Which query shape a collection's page fetch uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    /// Member-like rows: the full filter record applies.
    Membership,
    /// Post-like rows: search text only.
    Content,
    /// Like/comment/repost rows: restricted filter subset.
    Interaction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CollectionId {
    Members,
    JoinedHistory,
    LeftHistory,
    Posts,
    Likes,
    Comments,
    Reposts,
    MailingTargets,
    ContestWinners,
    ContestEntrants,
    ContestPosts,
    Authors,
}

impl CollectionId {
    pub const ALL: [CollectionId; 12] = [
        CollectionId::Members,
        CollectionId::JoinedHistory,
        CollectionId::LeftHistory,
        CollectionId::Posts,
        CollectionId::Likes,
        CollectionId::Comments,
        CollectionId::Reposts,
        CollectionId::MailingTargets,
        CollectionId::ContestWinners,
        CollectionId::ContestEntrants,
        CollectionId::ContestPosts,
        CollectionId::Authors,
    ];

    /// Static collection-to-group mapping.
    pub fn group(self) -> Group {
        match self {
            CollectionId::Members | CollectionId::JoinedHistory | CollectionId::LeftHistory => {
                Group::Membership
            }
            CollectionId::Posts
            | CollectionId::Likes
            | CollectionId::Comments
            | CollectionId::Reposts => Group::Activity,
            CollectionId::MailingTargets
            | CollectionId::ContestWinners
            | CollectionId::ContestEntrants
            | CollectionId::ContestPosts => Group::Automation,
            CollectionId::Authors => Group::Other,
        }
    }

    pub fn kind(self) -> CollectionKind {
        match self {
            CollectionId::Members
            | CollectionId::JoinedHistory
            | CollectionId::LeftHistory
            | CollectionId::MailingTargets
            | CollectionId::ContestWinners
            | CollectionId::ContestEntrants
            | CollectionId::Authors => CollectionKind::Membership,
            CollectionId::Posts | CollectionId::ContestPosts => CollectionKind::Content,
            CollectionId::Likes | CollectionId::Comments | CollectionId::Reposts => {
                CollectionKind::Interaction
            }
        }
    }

    /// Stable name used on the wire and in persisted state.
    pub fn api_slug(self) -> &'static str {
        match self {
            CollectionId::Members => "members",
            CollectionId::JoinedHistory => "joined-history",
            CollectionId::LeftHistory => "left-history",
            CollectionId::Posts => "posts",
            CollectionId::Likes => "likes",
            CollectionId::Comments => "comments",
            CollectionId::Reposts => "reposts",
            CollectionId::MailingTargets => "mailing-targets",
            CollectionId::ContestWinners => "contest-winners",
            CollectionId::ContestEntrants => "contest-entrants",
            CollectionId::ContestPosts => "contest-posts",
            CollectionId::Authors => "authors",
        }
    }

    pub fn from_slug(slug: &str) -> Option<CollectionId> {
        CollectionId::ALL
            .into_iter()
            .find(|id| id.api_slug() == slug)
    }
}
