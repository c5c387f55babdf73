//! Demo site
//!
//! A headless rendition of the Square landing page: navbar, hero, three
//! animated sections, stat counters, bound company data and a contact form.

use std::rc::Rc;

use square_platform::{ElementId, MemoryPage, Rect};

pub struct DemoSite {
    pub page: Rc<MemoryPage>,
    pub toggle: ElementId,
    pub menu: ElementId,
    pub navbar: ElementId,
    pub title: ElementId,
    pub cards: Vec<ElementId>,
    pub counters: Vec<ElementId>,
    pub bound: Vec<ElementId>,
    pub reveals: Vec<ElementId>,
    pub form: ElementId,
    pub about_link: ElementId,
}

pub fn build(reduced_motion: bool) -> DemoSite {
    let page = Rc::new(MemoryPage::new("/index.html").with_reduced_motion(reduced_motion));

    let navbar = page.build("nav").class("navbar").rect(Rect::band(0.0, 70.0)).finish();
    let toggle = page.build_in(navbar, "button").class("hamburger").finish();
    let menu = page.build_in(navbar, "ul").class("nav-menu").finish();
    for (label, href) in [("Home", "/"), ("About", "/about.html"), ("Contact", "#contact")] {
        page.build_in(menu, "a")
            .class("nav-link")
            .attr("href", href)
            .text(label)
            .finish();
    }

    let main = page.build("main").finish();
    let hero = page.build_in(main, "section").class("hero").rect(Rect::band(70.0, 700.0)).finish();
    let title = page.build_in(hero, "h1").class("hero-title").text("Square").finish();
    page.build_in(hero, "p")
        .class("hero-subtitle")
        .text("Cooling for the data centers of tomorrow")
        .finish();
    let buttons = page.build_in(hero, "div").class("hero-buttons").finish();
    let about_link = page
        .build_in(buttons, "a")
        .class("btn")
        .attr("href", "/about.html")
        .text("Learn more")
        .finish();
    page.build_in(buttons, "a")
        .class("btn")
        .attr("href", "#problem")
        .text("The problem")
        .finish();

    let stats = page.build_in(hero, "div").class("hero-stats").finish();
    let mut counters = Vec::new();
    for (target, text) in [("70", "0%"), ("500", "$0M"), ("42", "0")] {
        let stat = page.build_in(stats, "div").class("stat").finish();
        counters.push(
            page.build_in(stat, "span")
                .attr("data-target", target)
                .text(text)
                .finish(),
        );
    }

    let mut cards = Vec::new();
    let sections = [
        ("problem", "problem-card", 900.0),
        ("solution", "solution-feature", 1700.0),
        ("benefits", "benefit-card", 2500.0),
    ];
    for (id, class, top) in sections {
        let section = page
            .build_in(main, "section")
            .id_attr(id)
            .rect(Rect::band(top, 700.0))
            .finish();
        for i in 0..3 {
            cards.push(
                page.build_in(section, "div")
                    .class(class)
                    .class("card")
                    .rect(Rect::band(top + 100.0 + i as f32 * 150.0, 120.0))
                    .finish(),
            );
        }
    }

    let mut bound = Vec::new();
    let benefits = page.build_in(main, "section").id_attr("impact").rect(Rect::band(3300.0, 300.0)).finish();
    for path in [
        "problem_statement",
        "benefits.cost_reduction",
        "benefits.energy_reduction",
        "achievements.0.title",
    ] {
        bound.push(
            page.build_in(benefits, "span")
                .attr("data-bind", path)
                .text("--")
                .finish(),
        );
    }

    let mut reveals = Vec::new();
    for (i, top) in [3700.0, 3900.0, 4100.0].into_iter().enumerate() {
        reveals.push(
            page.build_in(main, "div")
                .class("reveal")
                .attr("data-stagger", &(i + 1).to_string())
                .rect(Rect::band(top, 150.0))
                .finish(),
        );
    }

    let contact = page
        .build_in(main, "section")
        .id_attr("contact")
        .rect(Rect::band(4400.0, 500.0))
        .finish();
    let form = page.build_in(contact, "form").attr("data-contact-form", "").finish();
    page.build_in(form, "input").attr("name", "name").finish();
    page.build_in(form, "input").attr("name", "email").finish();
    page.build_in(form, "textarea").attr("name", "message").finish();
    page.build_in(form, "button")
        .attr("type", "submit")
        .text("Send Message")
        .finish();

    DemoSite {
        page,
        toggle,
        menu,
        navbar,
        title,
        cards,
        counters,
        bound,
        reveals,
        form,
        about_link,
    }
}
