use leptos::prelude::*;
use leptos_router::components::*;
use leptos_router::path;

use crate::components::sidebar::Sidebar;
use crate::config::AppConfig;
use crate::pages::about::AboutPage;
use crate::pages::upload::UploadPage;

#[component]
pub fn App(config: AppConfig) -> impl IntoView {
    // One classifier per page load, handed to the pages that need it.
    let classifier = config.classifier.build();
    let description = classifier.describe();

    view! {
        <Router>
            <div class="app-layout">
                <Sidebar />
                <main class="content">
                    <Routes fallback=|| view! { <p>"Page not found"</p> }>
                        <Route
                            path=path!("/")
                            view=move || view! { <UploadPage classifier=classifier.clone() /> }
                        />
                        <Route
                            path=path!("/about")
                            view=move || view! { <AboutPage collaborator=description.clone() /> }
                        />
                    </Routes>
                </main>
            </div>
        </Router>
    }
}
