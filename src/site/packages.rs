//! Viewer growth packages offered on the pricing section and at checkout.

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Package {
    pub id: &'static str,
    pub name: &'static str,
    pub viewers: u32,
    pub price_cents: u32,
}

impl Package {
    #[must_use]
    pub fn price_label(&self) -> String {
        format!("${}.{:02}", self.price_cents / 100, self.price_cents % 100)
    }
}

pub const PACKAGES: &[Package] = &[
    Package {
        id: "starter",
        name: "Starter",
        viewers: 10,
        price_cents: 1_999,
    },
    Package {
        id: "growth",
        name: "Growth",
        viewers: 50,
        price_cents: 7_999,
    },
    Package {
        id: "pro",
        name: "Pro",
        viewers: 150,
        price_cents: 19_900,
    },
];

#[must_use]
pub fn find(id: &str) -> Option<&'static Package> {
    PACKAGES.iter().find(|package| package.id == id)
}
