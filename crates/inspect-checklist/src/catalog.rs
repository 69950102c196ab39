//! Regulatory checklist catalog
//!
//! Defines the Primary GMP checklist used for food-production premises.
//! Items marked (M) are major requirements on the paper form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Category, ChecklistItem};
use crate::rating::ItemId;
use crate::record::{FacilityInfo, InspectionRecord};

/// Static definition of one checklist category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    /// Stable identifier
    pub id: String,
    /// Heading as printed on the form
    pub title: String,
    /// Short description
    pub description: String,
    /// (item id, requirement) pairs in form order
    pub items: Vec<(String, String)>,
}

impl CategorySpec {
    fn from_static(id: &str, title: &str, description: &str, items: &[(&str, &str)]) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            items: items
                .iter()
                .map(|(id, prompt)| ((*id).to_string(), (*prompt).to_string()))
                .collect(),
        }
    }

    /// Build an unrated category from this definition
    pub fn instantiate(&self) -> Result<Category> {
        let items = self
            .items
            .iter()
            .map(|(id, prompt)| Ok(ChecklistItem::new(ItemId::new(id.as_str())?, prompt.clone())))
            .collect::<Result<Vec<_>>>()?;
        Category::new(&self.id, &self.title, &self.description, items)
    }
}

const BUILDING: &[(&str, &str)] = &[
    ("1.1", "Site is away from sources of contamination such as waste, hazardous substances, animal pens, smoke, dust and standing water"),
    ("1.2", "No accumulation of unused or unrelated items around or inside the production building"),
    ("1.3", "Drains inside and outside the building are suitable, sloped, unblocked and do not pool"),
    ("1.4.1", "Floors are durable, smooth, easy to clean, sloped to drains, clean and undamaged"),
    ("1.4.2", "Walls are durable, smooth, easy to clean, clean and undamaged"),
    ("1.4.3", "Ceilings and overhead fixtures are durable, easy to clean, do not contaminate, clean and undamaged"),
    ("1.5", "Building prevents animals and insects from entering production areas or touching food"),
    ("1.6", "Production area is sufficient and separated from living quarters, non-food production and eating areas"),
    ("1.7", "Production area is partitioned and follows the production line without cross-contamination"),
    ("1.8", "Packing room or packing-area controls prevent recontamination after sterilisation (M)"),
    ("1.9", "Ventilation controls airflow direction, prevents mould and is sufficient for work"),
    ("1.10", "Lighting in the production building is sufficient"),
];

const EQUIPMENT: &[(&str, &str)] = &[
    ("2.1", "Food-contact equipment is hygienically designed, of suitable material, easy to clean and free of uncleanable joints"),
    ("2.2", "Equipment is installed in suitable positions following the production line and is easy to clean"),
    ("2.3", "Equipment suits the food type and process and is sufficient in number"),
    ("2.4", "Food-contact work surfaces are hygienic, smooth, rust-free, easy to clean and at least 60 cm above the floor"),
    ("2.5", "Piping, pumps, joints, gaskets and valves in contact with food have no dead spots and can be fully cleaned"),
    ("2.6", "Equipment is cleaned regularly, sanitised before ready-to-eat use and stored hygienically after cleaning"),
    ("2.7", "Equipment is maintained in good working order; service life is recorded and parts replaced on schedule"),
    ("2.8", "Weighing and measuring devices are suitable, accurate and calibrated at least once a year"),
];

const PROCESS: &[(&str, &str)] = &[
    ("3.1", "Raw materials, ingredients and food additives"),
    ("3.1.1", "Raw materials and additives are selected for quality and safety with safety data per type"),
    ("3.1.2", "Raw materials are stored off the floor, segregated from hazardous and allergenic materials and used first-in first-out"),
    ("3.1.3", "Initial contamination of raw materials is reduced as needed (washing, trimming, sorting, blanching, filtering, chilling)"),
    ("3.2", "Packaging"),
    ("3.2.1", "Packaging is selected for safety and fitness for purpose and inspected for integrity"),
    ("3.2.2", "Packaging is stored, moved and used without contamination, first-in first-out"),
    ("3.2.3", "Packaging is cleaned or sanitised as needed and protected from recontamination until use"),
    ("3.3", "Mixing"),
    ("3.3.1", "Food additives and processing aids are used as legally permitted, weighed accurately, mixed evenly and recorded (M)"),
    ("3.3.2", "Mixing ratios of other ingredients follow the labelled or approved formula and are uniform"),
    ("3.3.3", "Water and ice used as ingredients or on ready-to-eat food meet the standard, are tested yearly and stored safely (M)"),
    ("3.3.4", "Mixed ingredients are held under conditions preventing spoilage and cross-contamination"),
    ("3.4", "Microbial reduction steps are controlled to safe levels, monitored regularly and recorded (M)"),
    ("3.5", "Processes without a microbial reduction step are strictly controlled against contamination throughout (M)"),
    ("3.6", "Filling and sealing"),
    ("3.6.1", "Filling and sealing are done promptly at controlled temperature with recontamination controls; preservatives used correctly"),
    ("3.6.2", "Seal integrity is inspected"),
    ("3.6.3", "Labels are complete with enough information for safe consumption"),
    ("3.7", "Raw materials, ingredients, additives and finished products are moved without cross-contamination (M)"),
    ("3.8", "Traceability information is kept for raw materials, packaging, finished and non-conforming products"),
    ("3.9", "Finished products"),
    ("3.9.1", "Finished products meet the applicable standard with analysis at least once a year (M)"),
    ("3.9.2", "Finished products are stored and transported to preserve quality and prevent cross-contamination"),
    ("3.10", "Production volume and distribution records are kept with a product recall procedure"),
    ("3.10.1", "Dietary supplement production (M)"),
    ("3.10.2", "Production of foods other than dietary supplements"),
    ("3.11", "Non-conforming products are segregated or destroyed"),
    ("3.12", "Records and reports are kept for at least one year past the labelled shelf life"),
    ("3.13", "Internal or external self-assessment against this regulation is done at least yearly with corrective actions"),
];

const SANITATION: &[(&str, &str)] = &[
    ("4.1", "Water used is clean and fit for its purpose"),
    ("4.2", "Toilets and hand basins are sufficient, working, hygienic, stocked and do not open onto production"),
    ("4.3", "Changing facilities and personal storage are sufficient, convenient and do not cause contamination"),
    ("4.4", "Hand-washing stations in production are sufficient, working, well placed and stocked"),
    ("4.5", "Pest control measures are effective"),
    ("4.6", "Waste is handled without contamination: suitable bins, locations, disposal frequency and transport"),
    ("4.7", "Chemicals are documented, used safely, stored apart from production, labelled and secured"),
    ("4.8", "Pest-control, cleaning and maintenance equipment is managed without causing contamination"),
];

const PERSONNEL: &[(&str, &str)] = &[
    ("5.1", "Workers and staff in production areas"),
    ("5.1.1", "Free of notifiable diseases and open wounds, with measures for workers showing symptoms"),
    ("5.1.2", "Keep personal hygiene such as short, unpainted nails"),
    ("5.1.3", "Wash hands before work, after contamination and before putting on gloves"),
    ("5.1.4", "Food-contact gloves are intact, clean, hygienic and made of food-safe material"),
    ("5.1.5", "Wear hair covers, clean uniforms or aprons and shoes, and masks where needed"),
    ("5.1.6", "No eating or smoking at work, no personal items or jewellery in production, no contaminating behaviour"),
    ("5.1.7", "Workers are trained to the appropriate level with records and follow hygiene signage"),
    ("5.2", "Visitors entering production areas follow procedures that prevent contamination"),
];

/// Registry of checklist categories
#[derive(Debug, Clone, Default)]
pub struct ChecklistCatalog {
    categories: Vec<CategorySpec>,
}

impl ChecklistCatalog {
    /// Create an empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the five Primary GMP categories
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        catalog.add(CategorySpec::from_static(
            "building",
            "Category 1: Location, production building, cleaning and maintenance",
            "Building structure, layout and ventilation",
            BUILDING,
        ));
        catalog.add(CategorySpec::from_static(
            "equipment",
            "Category 2: Machinery, production equipment, cleaning and maintenance",
            "Production equipment, tools and upkeep",
            EQUIPMENT,
        ));
        catalog.add(CategorySpec::from_static(
            "process",
            "Category 3: Production process control",
            "Production steps, storage and quality control",
            PROCESS,
        ));
        catalog.add(CategorySpec::from_static(
            "sanitation",
            "Category 4: Water, facilities and environmental hygiene",
            "Cleanliness, hand washing and toilets",
            SANITATION,
        ));
        catalog.add(CategorySpec::from_static(
            "personnel",
            "Category 5: Worker hygiene and safety",
            "Staff health, knowledge and attire",
            PERSONNEL,
        ));
        catalog
    }

    /// Add a category definition
    pub fn add(&mut self, spec: CategorySpec) {
        self.categories.push(spec);
    }

    /// Category definition by identifier
    #[must_use]
    pub fn category(&self, id: &str) -> Option<&CategorySpec> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// All category definitions in form order
    #[must_use]
    pub fn all(&self) -> &[CategorySpec] {
        &self.categories
    }

    /// Number of categories
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether the catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Total number of items across all categories
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }

    /// Instantiate every category, unrated
    pub fn instantiate(&self) -> Result<Vec<Category>> {
        self.categories.iter().map(CategorySpec::instantiate).collect()
    }

    /// Start a draft record covering the whole catalog
    pub fn new_record(
        &self,
        id: impl Into<String>,
        facility: FacilityInfo,
        license: impl Into<String>,
        inspectors: Vec<String>,
        inspection_date: NaiveDate,
    ) -> Result<InspectionRecord> {
        if self.is_empty() {
            return Err(Error::UnknownCategory("catalog has no categories".to_string()));
        }
        Ok(InspectionRecord::new(
            id,
            facility,
            license,
            inspectors,
            inspection_date,
            self.instantiate()?,
        ))
    }
}
