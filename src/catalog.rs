//! Resource catalog
//!
//! Filterable, searchable view over the seed library plus anything the
//! provider found through "ask AI". Generated resources are prepended and
//! never deduplicated; only bookmarks dedupe, by id.

use tracing::info;

use crate::provider::ContentService;
use crate::types::{ResourceItem, ResourceType};

/// Which slice of the catalog to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceFilter {
    #[default]
    All,
    /// Only bookmarked resources
    Saved,
    Type(ResourceType),
}

impl ResourceFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Some(ResourceFilter::All),
            "saved" => Some(ResourceFilter::Saved),
            other => ResourceType::parse(other).map(ResourceFilter::Type),
        }
    }
}

impl std::fmt::Display for ResourceFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceFilter::All => write!(f, "All"),
            ResourceFilter::Saved => write!(f, "Saved"),
            ResourceFilter::Type(t) => write!(f, "{}", t),
        }
    }
}

impl std::str::FromStr for ResourceFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceFilter::parse(s).ok_or_else(|| {
            format!("unknown filter '{}' (expected All, Saved, Book, Course, Paper or Tool)", s)
        })
    }
}

/// Case-insensitive substring match on the title or any tag. An empty
/// query matches everything.
pub fn matches_query(resource: &ResourceItem, query: &str) -> bool {
    let query = query.to_lowercase();
    resource.title.to_lowercase().contains(&query)
        || resource.tags.iter().any(|t| t.to_lowercase().contains(&query))
}

pub fn matches_filter(resource: &ResourceItem, filter: ResourceFilter, bookmarks: &[ResourceItem]) -> bool {
    match filter {
        ResourceFilter::All => true,
        ResourceFilter::Saved => bookmarks.iter().any(|b| b.id == resource.id),
        ResourceFilter::Type(t) => resource.resource_type == t,
    }
}

#[derive(Debug, Clone)]
pub struct ResourceCatalog {
    items: Vec<ResourceItem>,
}

impl ResourceCatalog {
    pub fn new(items: Vec<ResourceItem>) -> Self {
        Self { items }
    }

    /// The curated starter library
    pub fn with_seed() -> Self {
        Self::new(seed_resources())
    }

    /// Working set, newest generated results first
    pub fn items(&self) -> &[ResourceItem] {
        &self.items
    }

    pub fn find(&self, id: &str) -> Option<&ResourceItem> {
        self.items.iter().find(|r| r.id == id)
    }

    /// Look `id` up in the working set, then among `bookmarks`
    pub fn resolve<'a>(&'a self, id: &str, bookmarks: &'a [ResourceItem]) -> Option<&'a ResourceItem> {
        self.find(id).or_else(|| bookmarks.iter().find(|r| r.id == id))
    }

    /// Resources matching both the filter and the query.
    ///
    /// `Saved` draws from the bookmark collection itself, so bookmarks that
    /// are no longer in the working set still show up.
    pub fn filter<'a>(
        &'a self,
        query: &str,
        filter: ResourceFilter,
        bookmarks: &'a [ResourceItem],
    ) -> Vec<&'a ResourceItem> {
        let source = match filter {
            ResourceFilter::Saved => bookmarks,
            _ => self.items.as_slice(),
        };
        source
            .iter()
            .filter(|r| matches_filter(r, filter, bookmarks) && matches_query(r, query))
            .collect()
    }

    /// Ask the provider for more resources on `query` and put them at the
    /// front. Returns how many were added; an empty query does nothing.
    pub async fn ask_ai(&mut self, service: &ContentService, query: &str) -> usize {
        let query = query.trim();
        if query.is_empty() {
            return 0;
        }
        let found = service.generate_resources(query).await;
        let added = found.len();
        self.prepend(found);
        info!("Added {} generated resources for '{}'", added, query);
        added
    }

    pub fn prepend(&mut self, mut items: Vec<ResourceItem>) {
        items.append(&mut self.items);
        self.items = items;
    }
}

impl Default for ResourceCatalog {
    fn default() -> Self {
        Self::with_seed()
    }
}

fn seed(
    id: &str,
    title: &str,
    author: &str,
    resource_type: ResourceType,
    url: &str,
    description: &str,
    tags: &[&str],
) -> ResourceItem {
    ResourceItem {
        id: id.to_string(),
        title: title.to_string(),
        author: author.to_string(),
        resource_type,
        url: url.to_string(),
        description: description.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

pub fn seed_resources() -> Vec<ResourceItem> {
    vec![
        seed(
            "1",
            "Attention Is All You Need",
            "Vaswani et al.",
            ResourceType::Paper,
            "https://arxiv.org/abs/1706.03762",
            "The seminal paper introducing the Transformer architecture.",
            &["NLP", "Deep Learning"],
        ),
        seed(
            "2",
            "Deep Learning Book",
            "Ian Goodfellow",
            ResourceType::Book,
            "https://www.deeplearningbook.org/",
            "Comprehensive textbook on deep learning fundamentals.",
            &["Theory", "Math"],
        ),
        seed(
            "3",
            "Hugging Face Transformers",
            "Hugging Face",
            ResourceType::Tool,
            "https://huggingface.co/",
            "State-of-the-art Machine Learning for Pytorch, TensorFlow, and JAX.",
            &["Library", "NLP"],
        ),
        seed(
            "4",
            "Fast.ai Practical Deep Learning",
            "Jeremy Howard",
            ResourceType::Course,
            "https://course.fast.ai/",
            "Top-down approach to deep learning for coders.",
            &["Practical", "PyTorch"],
        ),
        seed(
            "5",
            "YOLOv8 Documentation",
            "Ultralytics",
            ResourceType::Tool,
            "https://docs.ultralytics.com/",
            "Real-time object detection framework.",
            &["Vision", "CNN"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::OfflineProvider;
    use crate::store::{MemoryStorage, ProgressionStore};

    fn ids(items: &[&ResourceItem]) -> Vec<String> {
        items.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(ResourceFilter::parse("all"), Some(ResourceFilter::All));
        assert_eq!(ResourceFilter::parse("SAVED"), Some(ResourceFilter::Saved));
        assert_eq!(ResourceFilter::parse("Tool"), Some(ResourceFilter::Type(ResourceType::Tool)));
        assert!("video".parse::<ResourceFilter>().is_err());
    }

    #[test]
    fn test_query_matches_title_or_tag() {
        let catalog = ResourceCatalog::with_seed();
        let none: [ResourceItem; 0] = [];

        assert_eq!(ids(&catalog.filter("", ResourceFilter::All, &none)).len(), 5);
        assert_eq!(ids(&catalog.filter("nlp", ResourceFilter::All, &none)), vec!["1", "3"]);
        assert_eq!(ids(&catalog.filter("DEEP", ResourceFilter::All, &none)), vec!["1", "2", "4"]);
        // author is not searched
        assert!(catalog.filter("Goodfellow", ResourceFilter::All, &none).is_empty());
    }

    #[test]
    fn test_type_filter_only_returns_that_type() {
        let catalog = ResourceCatalog::with_seed();
        let found = catalog.filter("", ResourceFilter::Type(ResourceType::Tool), &[]);
        assert_eq!(ids(&found), vec!["3", "5"]);
        assert!(found.iter().all(|r| r.resource_type == ResourceType::Tool));

        let nlp_tools = catalog.filter("nlp", ResourceFilter::Type(ResourceType::Tool), &[]);
        assert_eq!(ids(&nlp_tools), vec!["3"]);
    }

    #[test]
    fn test_saved_filter_is_subset_of_bookmarks() {
        let catalog = ResourceCatalog::with_seed();
        let mut external = catalog.items()[0].clone();
        external.id = "gen-elsewhere".to_string();
        let bookmarks = vec![catalog.items()[1].clone(), external];

        let saved = catalog.filter("", ResourceFilter::Saved, &bookmarks);
        assert_eq!(ids(&saved), vec!["2", "gen-elsewhere"]);
        assert!(saved.iter().all(|r| bookmarks.iter().any(|b| b.id == r.id)));

        assert_eq!(ids(&catalog.filter("math", ResourceFilter::Saved, &bookmarks)), vec!["2"]);
        assert!(catalog.filter("", ResourceFilter::Saved, &[]).is_empty());
    }

    #[tokio::test]
    async fn test_ask_ai_prepends_without_dedupe() {
        let service = ContentService::offline(OfflineProvider::instant());
        let mut catalog = ResourceCatalog::with_seed();

        assert_eq!(catalog.ask_ai(&service, "   ").await, 0);
        assert_eq!(catalog.items().len(), 5);

        assert_eq!(catalog.ask_ai(&service, "Vision").await, 3);
        assert_eq!(catalog.ask_ai(&service, "Vision").await, 3);
        assert_eq!(catalog.items().len(), 11);
        assert_eq!(catalog.items()[10].id, "5");
        assert!(catalog.items()[0].title.contains("Vision"));
        assert!(catalog.find("1").is_some());
    }

    #[tokio::test]
    async fn test_repeated_generation_keeps_ids_distinct_for_bookmarks() {
        let service = ContentService::offline(OfflineProvider::instant());
        let mut catalog = ResourceCatalog::with_seed();
        catalog.ask_ai(&service, "Vision").await;
        catalog.ask_ai(&service, "Robotics").await;

        let unique: std::collections::HashSet<_> = catalog.items().iter().map(|r| &r.id).collect();
        assert_eq!(unique.len(), catalog.items().len());

        let mut store = ProgressionStore::init(Box::new(MemoryStorage::new()));
        let robotics = catalog.items()[0].clone();
        assert!(robotics.title.contains("Robotics"));
        assert!(store.toggle_bookmark(&robotics));

        let saved = catalog.filter("", ResourceFilter::Saved, store.bookmarks());
        assert_eq!(ids(&saved), vec![robotics.id.clone()]);
        assert!(catalog
            .items()
            .iter()
            .filter(|r| r.title.contains("Vision"))
            .all(|r| !store.is_bookmarked(&r.id)));
    }
}
