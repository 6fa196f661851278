use crate::types::RegionMap;

const UNITED_STATES: &[&str] = &[
    "Alabama",
    "Alaska",
    "Arizona",
    "Arkansas",
    "California",
    "Colorado",
    "Connecticut",
    "Delaware",
    "District of Columbia",
    "Florida",
    "Georgia",
    "Hawaii",
    "Idaho",
    "Illinois",
    "Indiana",
    "Iowa",
    "Kansas",
    "Kentucky",
    "Louisiana",
    "Maine",
    "Maryland",
    "Massachusetts",
    "Michigan",
    "Minnesota",
    "Mississippi",
    "Missouri",
    "Montana",
    "Nebraska",
    "Nevada",
    "New Hampshire",
    "New Jersey",
    "New Mexico",
    "New York",
    "North Carolina",
    "North Dakota",
    "Ohio",
    "Oklahoma",
    "Oregon",
    "Pennsylvania",
    "Rhode Island",
    "South Carolina",
    "South Dakota",
    "Tennessee",
    "Texas",
    "Utah",
    "Vermont",
    "Virginia",
    "Washington",
    "West Virginia",
    "Wisconsin",
    "Wyoming",
];

const SOUTH_AMERICA: &[&str] = &[
    "Argentina",
    "Bolivia",
    "Brazil",
    "Chile",
    "Colombia",
    "Ecuador",
    "Falkland Islands",
    "French Guiana",
    "Guyana",
    "Paraguay",
    "Peru",
    "South Georgia and the South Sandwich Islands",
    "Suriname",
    "Uruguay",
    "Venezuela",
];

const EUROPE: &[&str] = &[
    "Austria",
    "Belgium",
    "Denmark",
    "Finland",
    "France",
    "Germany",
    "Ireland",
    "Italy",
    "Netherlands",
    "Norway",
    "Poland",
    "Portugal",
    "Spain",
    "Sweden",
    "Switzerland",
    "United Kingdom",
];

/// Region catalog served by a default in-memory backend.
///
/// Region names follow the directional-DNS convention of naming a group and
/// listing the territories it covers; `"Mexico"` is a region holding only itself.
pub fn default_regions() -> RegionMap {
    [
        ("Anonymous Proxy", &["Anonymous Proxy"][..]),
        ("Europe", EUROPE),
        ("Mexico", &["Mexico"][..]),
        ("Satellite Provider", &["Satellite Provider"][..]),
        ("South America", SOUTH_AMERICA),
        ("United States", UNITED_STATES),
    ]
    .into_iter()
    .map(|(region, territories)| {
        (
            region.to_string(),
            territories.iter().map(|t| (*t).to_string()).collect(),
        )
    })
    .collect()
}
