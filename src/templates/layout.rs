use maud::{html, Markup, DOCTYPE};

use crate::db::models::User;

/// Page shell for signed-in screens: navigation bar, content and footer.
pub fn base_layout(title: &str, user: &User, content: Markup) -> Markup {
    document(
        title,
        html! {
            (nav_bar(user))

            main class="container mx-auto px-4 py-8" {
                (content)
            }

            (footer())
        },
    )
}

/// Shell for the login and registration forms, without navigation.
pub fn auth_layout(title: &str, content: Markup) -> Markup {
    document(
        title,
        html! {
            main class="min-h-full flex items-center justify-center px-4 py-12" {
                div class="w-full max-w-md" {
                    div class="text-center mb-8" {
                        span class="text-4xl" { "🎵" }
                        h1 class="text-3xl font-bold text-gray-900 mt-2" { "Music Catalog" }
                    }
                    (content)
                }
            }
        },
    )
}

fn document(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" class="h-full" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " - Music Catalog" }

                link rel="stylesheet" href="/static/css/output.css";
                script src="https://unpkg.com/htmx.org@1.9.10" {}

                style {
                    r#"
                    .catalog-card:hover {
                        transform: translateY(-4px);
                        box-shadow: 0 10px 20px rgba(0,0,0,0.1);
                    }
                    "#
                }
            }
            body class="h-full bg-gray-50" {
                div class="min-h-full" {
                    (body)
                }
            }
        }
    }
}

fn nav_bar(user: &User) -> Markup {
    html! {
        nav class="bg-white shadow-sm" {
            div class="container mx-auto px-4" {
                div class="flex justify-between items-center h-16" {
                    a href="/" class="flex items-center space-x-3" {
                        span class="text-2xl" { "🎵" }
                        span class="text-xl font-bold text-gray-900" { "Music Catalog" }
                    }

                    div class="flex items-center space-x-4" {
                        a href="/" class="text-gray-700 hover:text-primary px-3 py-2 rounded-md text-sm font-medium" {
                            "Genres"
                        }
                        @if user.is_admin() {
                            a href="/admin" class="text-gray-700 hover:text-primary px-3 py-2 rounded-md text-sm font-medium" {
                                "Admin"
                            }
                        }
                        span class="text-sm text-gray-500" title=(user.email) {
                            (user.display_name)
                        }
                        form method="post" action="/logout" {
                            button
                                type="submit"
                                class="px-3 py-2 text-sm font-medium text-gray-700 border border-gray-300 rounded-md hover:bg-gray-50" {
                                "Log out"
                            }
                        }
                    }
                }
            }
        }
    }
}

fn footer() -> Markup {
    html! {
        footer class="bg-white border-t border-gray-200 mt-12" {
            div class="container mx-auto px-4 py-6" {
                div class="text-center text-gray-600 text-sm" {
                    "Music Catalog - Browse genres, artists and songs"
                }
            }
        }
    }
}
