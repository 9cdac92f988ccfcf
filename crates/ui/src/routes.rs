use dioxus::prelude::*;
use dioxus_router::{Link, Outlet, Routable};

use crate::views::{AttemptView, HomeView, ResultView};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", HomeView)] Home {},
        #[route("/attempt/:module/:test_id", AttemptView)] Attempt { module: String, test_id: u64 },
        #[route("/results/:module/:result_id", ResultView)] Result { module: String, result_id: u64 },
}

#[component]
fn Layout() -> Element {
    rsx! {
        div { class: "app",
            nav { class: "topbar",
                h1 { class: "topbar-brand", "BandPrep" }
                ul { class: "topbar-links",
                    li { Link { to: Route::Home {}, "Tests" } }
                }
            }
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}
