//! Page assembly
//!
//! Loads every section of the home page at once and hands the results to the
//! view renderer. Dropping the returned future cancels all in-flight fetches.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use super::loader::{SectionLoader, SingletonContent};
use super::sections::{HERO_COLLECTION, PROFILE_COLLECTION, SECTIONS};
use super::visibility::VisibilityResolver;
use crate::cache::SharedCache;
use crate::models::{AuthorProfile, Hero, Notice, SectionKey};
use crate::render::{
    format_date, render_section, session::session_id, MarkdownRenderer, PageView, PostView, RenderOptions,
};
use crate::store::{DynContentStore, Filter, StoreError};

const BLOG_COLLECTION: &str = "blog_posts";

pub struct PageService {
    store: DynContentStore,
    loader: Arc<SectionLoader>,
    visibility: Arc<VisibilityResolver>,
    markdown: MarkdownRenderer,
    options: RenderOptions,
    site_title: String,
    timeout: Duration,
}

impl PageService {
    pub fn new(
        store: DynContentStore,
        cache: SharedCache,
        timeout: Duration,
        site_title: impl Into<String>,
        options: RenderOptions,
    ) -> Self {
        Self {
            loader: Arc::new(SectionLoader::new(store.clone(), cache.clone(), timeout)),
            visibility: Arc::new(VisibilityResolver::new(store.clone(), cache, timeout)),
            store,
            markdown: MarkdownRenderer::new(),
            options,
            site_title: site_title.into(),
            timeout,
        }
    }

    pub fn loader(&self) -> &SectionLoader {
        &self.loader
    }

    pub fn visibility(&self) -> &VisibilityResolver {
        &self.visibility
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn site_title(&self) -> &str {
        &self.site_title
    }

    /// Every section, loaded concurrently; never fails
    pub async fn load_home(&self) -> PageView {
        let (contents, visible, hero, profile) = futures::join!(
            join_all(SECTIONS.iter().map(|spec| self.loader.load(spec))),
            join_all(SectionKey::ALL.iter().map(|key| self.visibility.is_visible(key.as_str()))),
            self.loader.load_singleton(HERO_COLLECTION, SectionKey::Hero.as_str()),
            self.loader.load_singleton(PROFILE_COLLECTION, SectionKey::About.as_str()),
        );
        let is_visible = |key: SectionKey| {
            SectionKey::ALL
                .iter()
                .position(|k| *k == key)
                .and_then(|i| visible.get(i).copied())
                .unwrap_or(true)
        };

        let mut notices: Vec<Notice> = Vec::new();
        let SingletonContent { item: hero_item, failure } = hero;
        notices.extend(failure);
        let SingletonContent { item: profile_item, failure } = profile;
        notices.extend(failure);

        let hero = is_visible(SectionKey::Hero)
            .then(|| hero_item.as_ref().map(Hero::from_item).unwrap_or_default());
        let about = profile_item
            .as_ref()
            .map(AuthorProfile::from_item)
            .filter(|profile| is_visible(SectionKey::About) && !profile.is_empty());

        let mut sections = Vec::new();
        for (spec, content) in SECTIONS.iter().zip(contents) {
            notices.extend(content.failure.clone());
            if let Some(view) = render_section(spec, is_visible(spec.key), &content, &self.options) {
                sections.push(view);
            }
        }

        if !notices.is_empty() {
            tracing::info!("Home page served with {} degraded section(s)", notices.len());
        }

        PageView {
            site_title: self.site_title.clone(),
            session_id: session_id(),
            hero,
            about,
            sections,
            notices,
        }
    }

    /// A published blog post; `Ok(None)` when no visible post has this slug
    pub async fn load_post(&self, slug: &str) -> Result<Option<PostView>, StoreError> {
        let filter = Filter::new().eq("slug", slug).eq("is_visible", true);
        let result = super::loader::with_timeout(
            self.timeout,
            self.store.fetch_single(BLOG_COLLECTION, &filter),
        )
        .await;

        let post = match result {
            Ok(post) => post,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        let rendered = self.markdown.render(post.get_str("content").unwrap_or_default());
        Ok(Some(PostView {
            site_title: self.site_title.clone(),
            session_id: session_id(),
            slug: slug.to_string(),
            title: post.get_str("title").unwrap_or(slug).to_string(),
            date: post.get_date("published_at").map(format_date),
            cover_image: post.get_str("cover_image").map(str::to_string),
            html: rendered.html,
            toc: rendered.toc,
        }))
    }
}
