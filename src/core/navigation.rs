/// Pages of the launchpad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Public landing page
    Home,
    CreateCollection,
    MyCollections,
    /// Public mint page
    Mint,
}

impl Route {
    pub const ALL: [Route; 4] = [Route::Home, Route::CreateCollection, Route::MyCollections, Route::Mint];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::CreateCollection => "/create-collection",
            Route::MyCollections => "/my-collections",
            Route::Mint => "/mint",
        }
    }

    pub fn from_path(path: &str) -> Option<Route> {
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        Self::ALL.into_iter().find(|route| route.path() == normalized)
    }

    /// Creator-only pages
    pub fn is_creator_only(&self) -> bool {
        matches!(self, Route::CreateCollection | Route::MyCollections)
    }
}

/// Router of the hosting page; navigation replaces the current history entry
pub trait Navigator {
    fn navigate(&self, route: Route);
}

impl<T: Navigator + ?Sized> Navigator for &T {
    fn navigate(&self, route: Route) {
        (**self).navigate(route)
    }
}
