// Declares the report columns once: variant order is column order,
// so `Field as usize` is the column index.
macro_rules! report_schema {
    ($($variant:ident => $header:expr),+ $(,)?) => {
        /// A named column of the merged report.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Field {
            $($variant),+
        }

        impl Field {
            /// Every column, in output order.
            pub const ALL: &'static [Field] = &[$(Field::$variant),+];

            /// Header text written to row 0 of the report.
            pub fn header(self) -> &'static str {
                match self {
                    $(Field::$variant => $header),+
                }
            }
        }
    };
}

report_schema! {
    Type => "Type",
    PropertyPhoto => "Property Photo",
    StreetAddress => "Street Address",
    Suburb => "Suburb",
    State => "State",
    Postcode => "Postcode",
    SiteZoning => "Site Zoning",
    PropertyType => "Property Type",
    Bed => "Bed",
    Bath => "Bath",
    Car => "Car",
    ExtraCostForParks => "Extra Cost for Parks",
    LandSize => "Land Size (m²)",
    FloorSize => "Floor Size (m²)",
    YearBuilt => "Year Built",
    Agency => "Agency",
    Agent => "Agent",
    ContactPhone => "Contact Phone",
    Email => "Email",
    Contacted => "Contacted (T/F)",
    LandUse => "Land Use",
    DevelopmentZone => "Development Zone",
    ParcelDetails => "Parcel Details",
    OwnerType => "Owner Type",
    WebsiteLink => "Website Link",
    // Sales only
    SalePrice => "Sale Price",
    SaleDate => "Sale Date",
    SettlementDate => "Settlement Date",
    SaleType => "Sale Type",
    Owner1Name => "Owner 1 Name",
    Owner2Name => "Owner 2 Name",
    Owner3Name => "Owner 3 Name",
    Vendor1Name => "Vendor 1 Name",
    Vendor2Name => "Vendor 2 Name",
    Vendor3Name => "Vendor 3 Name",
    // For Sale only
    FirstListedPrice => "First Listed Price",
    FirstListedDate => "First Listed Date",
    LastListedPrice => "Last Listed Price",
    LastListedDate => "Last Listed Date",
    ListingType => "Listing Type",
    // For Rent only
    FirstRentalPrice => "First Rental Price",
    FirstRentalDate => "First Rental Date",
    LastRentalPrice => "Last Rental Price",
    LastRentalDate => "Last Rental Date",
    OutgoingsExGst => "Outgoings Ex GST",
    TotalLeasePrice => "Total Lease Price (Base + Outgoings)",
    // For Sale and For Rent
    DaysOnMarket => "Days on Market",
    ActiveListing => "Active Listing",
    // Filled in by hand after the report is delivered
    Comments => "Comments Y=Recommended, E=Evaluating, R=Rejected",
    DateAdded => "Date Added",
    DatePresented => "Date Presented",
    AllowableUse => "Allowable Use in Zone (T/F)",
    PricePerSqm => "$/m²",
    Available => "Available (T/F)",
    Suitable => "Suitable (T/F)",
    PutInReport => "PUT IN REPORT (T/F)",
    ClientFeedback => "Client Feedback",
    BusiComment => "Busi's Comment",
}

pub const COLUMN_COUNT: usize = Field::ALL.len();

impl Field {
    pub fn index(self) -> usize {
        self as usize
    }

    /// Report column width in characters.
    pub fn width(self) -> f64 {
        match self {
            Field::StreetAddress | Field::WebsiteLink => 30.0,
            Field::SiteZoning => 35.0,
            Field::Suburb
            | Field::PropertyType
            | Field::ExtraCostForParks
            | Field::Agency
            | Field::Agent
            | Field::LandUse
            | Field::DevelopmentZone
            | Field::ParcelDetails => 20.0,
            Field::Email => 25.0,
            Field::State | Field::Postcode | Field::AllowableUse => 10.0,
            Field::Bed | Field::Bath | Field::Car => 8.0,
            Field::YearBuilt => 12.0,
            _ => 15.0,
        }
    }
}
