//! Stored routine names
//!
//! Every routine the HTTP surface calls is named here and nowhere else.

pub mod news {
    /// Published news, filtered and paged; result sets `items`, `total`
    pub const LIST_PUBLISHED: &str = "news.list_published";
    /// All news regardless of status; result sets `items`, `total`
    pub const LIST: &str = "news.list_news";
    pub const GET_PUBLISHED: &str = "news.get_published";
    pub const GET: &str = "news.get_news";
    pub const RELATED: &str = "news.list_related";
    pub const REGISTER_VIEW: &str = "news.register_view";
    pub const CREATE: &str = "news.create_news";
    pub const UPDATE: &str = "news.update_news";
    pub const DELETE: &str = "news.delete_news";
    pub const REPLACE_CATEGORIES: &str = "news.replace_categories";
}

pub mod media {
    /// Published media, filtered and paged; result sets `items`, `total`
    pub const LIST_PUBLISHED: &str = "media.list_published";
    /// All media regardless of status; result sets `items`, `total`
    pub const LIST: &str = "media.list_media";
    pub const GET_PUBLISHED: &str = "media.get_published";
    pub const GET: &str = "media.get_media";
    pub const LIST_GALLERIES: &str = "media.list_galleries";
    pub const GALLERY_MEDIA: &str = "media.list_gallery_media";
    pub const REGISTER_VIEW: &str = "media.register_view";
    pub const REGISTER_SHARE: &str = "media.register_share";
}

/// Result set names of every paged list routine
pub const PAGE_SETS: [&str; 2] = ["items", "total"];
