use leptos::prelude::*;

#[component]
pub fn Sidebar() -> impl IntoView {
    view! {
        <nav class="sidebar">
            <div class="sidebar-header">
                <h1 class="sidebar-title">"PneumoScan"</h1>
                <p class="sidebar-subtitle">"Chest X-Ray Screening"</p>
            </div>
            <ul class="nav-list">
                <li class="nav-item">
                    <a href="/" class="nav-link">"Analyze X-Ray"</a>
                </li>
                <li class="nav-item">
                    <a href="/about" class="nav-link">"About the Model"</a>
                </li>
            </ul>
        </nav>
    }
}
