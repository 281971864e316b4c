use crate::{
    client::{Client, Params},
    errors::EnomError,
    response::{self, ExtendedAttributes},
    suffix,
};
use chrono::{Local, Months, NaiveDate};
use serde_json::Value;
use std::{fmt, str::FromStr};
use tracing::{debug, info};

pub const MIN_NAMESERVERS: usize = 2;
pub const MAX_NAMESERVERS: usize = 12;
pub const MIN_RENEWAL_YEARS: u32 = 1;
pub const MAX_RENEWAL_YEARS: u32 = 10;

pub const DEFAULT_SUGGEST_RESULTS: u32 = 8;
pub const DEFAULT_SUGGEST_SIMILARITY: &str = "High";
pub const DEFAULT_SUGGEST_TLDS: [&str; 4] = ["com", "net", "tv", "cc"];

/// A lazily fetched attribute. Once resolved it is never refetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cached<T> {
    Unresolved,
    Resolved(T),
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Cached::Unresolved
    }
}

impl<T> Cached<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            Cached::Resolved(value) => Some(value),
            Cached::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Cached::Resolved(_))
    }

    /// Resolve to `value` unless already resolved.
    pub fn fill(&mut self, value: T) {
        if let Cached::Unresolved = self {
            *self = Cached::Resolved(value);
        }
    }
}

/// TLD bundles the registrar can check in one `Check` call.
///
/// | code | TLDs |
/// |------|------|
/// | `*`  | com, net, org, info, biz, us, ws, cc, tv, bz, nu |
/// | `*1` | com, net, org, info, biz, us, ws |
/// | `*2` | com, net, org, info, biz, us |
/// | `@`  | com, net, org |
///
/// An explicit list is accepted by the type but rejected by the registrar,
/// so `check_multiple_tlds` refuses it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TldList {
    #[default]
    All,
    Primary,
    Secondary,
    Core,
    Custom(Vec<String>),
}

impl TldList {
    pub fn code(&self) -> Option<&'static str> {
        match self {
            TldList::All => Some("*"),
            TldList::Primary => Some("*1"),
            TldList::Secondary => Some("*2"),
            TldList::Core => Some("@"),
            TldList::Custom(_) => None,
        }
    }
}

impl FromStr for TldList {
    type Err = EnomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "*" => Ok(TldList::All),
            "*1" => Ok(TldList::Primary),
            "*2" => Ok(TldList::Secondary),
            "@" => Ok(TldList::Core),
            "" => Err(EnomError::InvalidArgument("empty TLD list".to_string())),
            list => Ok(TldList::Custom(
                list.split(',')
                    .map(|tld| tld.trim().trim_start_matches('.').to_string())
                    .filter(|tld| !tld.is_empty())
                    .collect(),
            )),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterOptions {
    /// Sent as `NS1..NSn`; without it the registrar's default DNS is used.
    pub nameservers: Option<Vec<String>>,
    pub years: Option<u32>,
    /// Merged last, so these override anything above.
    pub extra: Params,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransferOptions {
    pub renew: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RenewOptions {
    pub years: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct SuggestOptions {
    pub max_results: Option<u32>,
    pub similar: Option<String>,
    pub tlds: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncAuthInfoOptions {
    /// Ask the registrar to email the EPP code to the registrant.
    pub email: bool,
}

/// A domain as the registrar reports it.
///
/// This is a snapshot: attributes that need a second round trip are
/// fetched on first access and kept for the life of the value. Local
/// overrides made after renewals stick.
#[derive(Debug, Clone)]
pub struct Domain {
    name: String,
    sld: String,
    tld: String,
    expiration_date: NaiveDate,
    registration_status: Cached<String>,
    nameservers: Cached<Vec<String>>,
    locked: Cached<bool>,
    auto_renew: Cached<bool>,
    client: Client,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Domain {
    /// Build from a `GetDomainInfo` payload or a `GetAllDomains` detail.
    pub fn from_attributes(client: &Client, raw: &Value) -> Result<Self, EnomError> {
        let attributes = response::domain_attributes(raw)?;
        let (sld, tld) = suffix::parse_sld_and_tld(&attributes.name)?;

        let mut domain = Self {
            name: attributes.name,
            sld,
            tld,
            expiration_date: attributes.expiration_date,
            registration_status: Cached::Unresolved,
            nameservers: Cached::Unresolved,
            locked: Cached::Unresolved,
            auto_renew: Cached::Unresolved,
            client: client.clone(),
        };
        if let Some(extended) = attributes.extended {
            domain.apply_extended(extended);
        }
        Ok(domain)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sld(&self) -> &str {
        &self.sld
    }

    pub fn tld(&self) -> &str {
        &self.tld
    }

    pub fn expiration_date(&self) -> NaiveDate {
        self.expiration_date
    }

    pub fn set_expiration_date(&mut self, date: NaiveDate) {
        self.expiration_date = date;
    }

    pub fn set_registration_status(&mut self, status: impl Into<String>) {
        self.registration_status = Cached::Resolved(status.into());
    }

    fn split(name: &str, tld: Option<&str>) -> Result<(String, String), EnomError> {
        match tld.filter(|t| !t.trim().is_empty()) {
            Some(tld) => Ok((name.to_string(), tld.to_string())),
            None => suffix::parse_sld_and_tld(name),
        }
    }

    fn base_params(command: &str, sld: &str, tld: &str) -> Params {
        Params::command(command).with("SLD", sld).with("TLD", tld)
    }

    /// Look up a domain in the account. With `tld`, `name` is taken as the
    /// second-level label as-is.
    pub async fn find(client: &Client, name: &str, tld: Option<&str>) -> Result<Self, EnomError> {
        let (sld, tld) = Self::split(name, tld)?;
        debug!("Finding {}.{}", sld, tld);

        let response = client.request(Self::base_params("GetDomainInfo", &sld, &tld)).await?;
        Self::from_attributes(client, response::domain_info(&response)?)
    }

    /// Whether the name can be registered: the `Check` code is exactly `"210"`.
    pub async fn available(client: &Client, name: &str, tld: Option<&str>) -> Result<bool, EnomError> {
        let (sld, tld) = Self::split(name, tld)?;

        let response = client.request(Self::base_params("Check", &sld, &tld)).await?;
        let code = response::check_code(&response)?;
        debug!("Check {}.{}: RRPCode {}", sld, tld, code);
        Ok(code == response::AVAILABLE_CODE)
    }

    /// `"available"` or `"unavailable"`.
    pub async fn check(client: &Client, name: &str, tld: Option<&str>) -> Result<&'static str, EnomError> {
        Ok(if Self::available(client, name, tld).await? {
            "available"
        } else {
            "unavailable"
        })
    }

    /// Available names for `sld` across one of the registrar's TLD bundles,
    /// in the order the response lists them.
    pub async fn check_multiple_tlds(
        client: &Client,
        sld: &str,
        tlds: &TldList,
    ) -> Result<Vec<String>, EnomError> {
        let code = tlds.code().ok_or_else(|| {
            EnomError::NotImplemented(
                "the registrar does not accept explicit TLD lists; use *, *1, *2 or @".to_string(),
            )
        })?;

        let response = client.request(Self::base_params("Check", sld, code)).await?;
        Ok(response::available_domains(&response))
    }

    /// Every domain in the account, in response order.
    pub async fn all(client: &Client) -> Result<Vec<Self>, EnomError> {
        let response = client.request(Params::command("GetAllDomains")).await?;
        response::domain_details(&response)?
            .into_iter()
            .map(|detail| Self::from_attributes(client, detail))
            .collect()
    }

    /// Purchase a domain, then read it back with `find`.
    pub async fn register(client: &Client, name: &str, options: RegisterOptions) -> Result<Self, EnomError> {
        let (sld, tld) = suffix::parse_sld_and_tld(name)?;
        let mut params = Self::base_params("Purchase", &sld, &tld);

        match &options.nameservers {
            Some(nameservers) => {
                for (i, nameserver) in nameservers.iter().enumerate() {
                    params.set(format!("NS{}", i + 1), nameserver);
                }
            }
            None => params.set("UseDNS", "default"),
        }
        if let Some(years) = options.years {
            params.set("NumYears", years);
        }
        let params = params.merge(options.extra);

        info!("Registering {}", name);
        client.request(params).await?;
        Self::find(client, name, None).await
    }

    /// Delete a registration. The registrar only allows this within five
    /// days of purchase and for allow-listed resellers; its refusal comes
    /// back as `false`.
    pub async fn delete(client: &Client, name: &str, extra: Params) -> Result<bool, EnomError> {
        let (sld, tld) = suffix::parse_sld_and_tld(name)?;

        info!("Deleting registration for {}", name);
        let response = client
            .request(Self::base_params("DeleteRegistration", &sld, &tld).merge(extra))
            .await?;
        Ok(response.field("RRPCode").and_then(|code| code.trim().parse::<i64>().ok()) == Some(200))
    }

    /// Order a transfer in with the domain's auth (EPP) code. The account
    /// is charged when the order goes through.
    pub async fn transfer(
        client: &Client,
        name: &str,
        auth_code: &str,
        options: TransferOptions,
    ) -> Result<bool, EnomError> {
        let (sld, tld) = suffix::parse_sld_and_tld(name)?;

        let mut params = Params::command("TP_CreateOrder")
            .with("OrderType", "AutoVerification")
            .with("DomainCount", 1)
            .with("SLD1", &sld)
            .with("TLD1", &tld)
            .with("AuthInfo1", auth_code)
            .with("UseContacts", 1);
        if options.renew {
            params.set("Renew", 1);
        }

        info!("Transferring {}", name);
        let response = client.request(params).await?;
        Ok(response.err_count() == Some(0))
    }

    /// Extend a registration. `find` lags behind the registry, so the
    /// expiration comes from the `Extend` response itself.
    pub async fn renew(client: &Client, name: &str, options: RenewOptions) -> Result<Self, EnomError> {
        let (sld, tld) = suffix::parse_sld_and_tld(name)?;
        let mut params = Self::base_params("Extend", &sld, &tld);
        if let Some(years) = options.years {
            params.set("NumYears", years);
        }

        info!("Renewing {}", name);
        let renewal = client.request(params).await?;
        let mut domain = Self::find(client, name, None).await?;
        domain.expiration_date = response::registry_expiration(&renewal)?;
        Ok(domain)
    }

    /// Renew a domain that has already expired. `Ok(None)` when the
    /// registrar reports errors.
    pub async fn update_expired(client: &Client, name: &str, years: u32) -> Result<Option<Self>, EnomError> {
        if !(MIN_RENEWAL_YEARS..=MAX_RENEWAL_YEARS).contains(&years) {
            return Err(EnomError::InvalidArgument(format!(
                "Renewal years must be an integer between {} and {}",
                MIN_RENEWAL_YEARS, MAX_RENEWAL_YEARS
            )));
        }

        let params = Params::command("UpdateExpiredDomains")
            .with("DomainName", name)
            .with("NumYears", years);

        info!("Renewing expired {} for {} year(s)", name, years);
        let response = client.request(params).await?;
        if response.err_count() != Some(0) {
            debug!("UpdateExpiredDomains failed for {}: {:?}", name, response.errors());
            return Ok(None);
        }

        let mut domain = Self::find(client, name, None).await?;
        domain.assume_renewed(years, Local::now().date_naive()).await?;
        Ok(Some(domain))
    }

    // The registrar does not reflect an expired renewal right away, so
    // advance the date and status locally.
    async fn assume_renewed(&mut self, years: u32, today: NaiveDate) -> Result<(), EnomError> {
        if self.expiration_date < today {
            if let Some(advanced) = self.expiration_date.checked_add_months(Months::new(12 * years)) {
                self.expiration_date = advanced;
            }
        }
        if self.registration_status().await? == "Expired" {
            self.registration_status = Cached::Resolved("Registered".to_string());
        }
        Ok(())
    }

    /// Available alternatives from the registrar's name spinner, candidate
    /// by candidate, each in target-TLD order.
    pub async fn suggest(client: &Client, name: &str, options: SuggestOptions) -> Result<Vec<String>, EnomError> {
        let (sld, tld) = suffix::parse_sld_and_tld(name)?;
        let params = Self::base_params("namespinner", &sld, &tld)
            .with("MaxResults", options.max_results.unwrap_or(DEFAULT_SUGGEST_RESULTS))
            .with(
                "Similar",
                options.similar.as_deref().unwrap_or(DEFAULT_SUGGEST_SIMILARITY),
            );

        let tlds = options
            .tlds
            .unwrap_or_else(|| DEFAULT_SUGGEST_TLDS.iter().map(|t| t.to_string()).collect());

        let response = client.request(params).await?;
        response::spun_names(&response, &tlds)
    }

    /// Prevent transfers away from the registrar.
    pub async fn lock(&mut self) -> Result<(), EnomError> {
        self.set_reg_lock(true).await
    }

    /// Permit transfers away from the registrar.
    pub async fn unlock(&mut self) -> Result<(), EnomError> {
        self.set_reg_lock(false).await
    }

    async fn set_reg_lock(&mut self, locked: bool) -> Result<(), EnomError> {
        // Enom's flag is "unlock": 0 locks, 1 unlocks
        let flag = if locked { "0" } else { "1" };
        self.client
            .request(Self::base_params("SetRegLock", &self.sld, &self.tld).with("UnlockRegistrar", flag))
            .await?;
        self.locked = Cached::Resolved(locked);
        Ok(())
    }

    pub async fn locked(&mut self) -> Result<bool, EnomError> {
        if let Some(locked) = self.locked.get() {
            return Ok(*locked);
        }
        let response = self
            .client
            .request(Self::base_params("GetRegLock", &self.sld, &self.tld))
            .await?;
        let locked = response::reg_lock(&response);
        self.locked = Cached::Resolved(locked);
        Ok(locked)
    }

    pub async fn unlocked(&mut self) -> Result<bool, EnomError> {
        Ok(!self.locked().await?)
    }

    /// Whether the registrar renews the domain automatically. Expired
    /// domains cannot auto-renew and are answered without asking.
    pub async fn auto_renew(&mut self) -> Result<bool, EnomError> {
        if let Some(auto_renew) = self.auto_renew.get() {
            return Ok(*auto_renew);
        }

        let auto_renew = if self.is_expired().await? {
            false
        } else {
            let response = self
                .client
                .request(Self::base_params("GetRenew", &self.sld, &self.tld))
                .await?;
            response::auto_renew_flag(&response)?
        };
        self.auto_renew = Cached::Resolved(auto_renew);
        Ok(auto_renew)
    }

    pub async fn set_auto_renew(&mut self, enabled: bool) -> Result<(), EnomError> {
        self.client
            .request(
                Self::base_params("SetRenew", &self.sld, &self.tld)
                    .with("RenewFlag", if enabled { 1 } else { 0 }),
            )
            .await?;
        self.auto_renew = Cached::Resolved(enabled);
        Ok(())
    }

    /// Synchronize the EPP key with the registry.
    pub async fn sync_auth_info(&self, options: SyncAuthInfoOptions) -> Result<(), EnomError> {
        let mut params = Self::base_params("SynchAuthInfo", &self.sld, &self.tld).with("RunSynchAutoInfo", "True");
        if options.email {
            params.set("EmailEPP", "True");
        }
        self.client.request(params).await?;
        Ok(())
    }

    pub async fn nameservers(&mut self) -> Result<&[String], EnomError> {
        if !self.nameservers.is_resolved() {
            self.fetch_extended_attributes().await?;
        }
        Ok(self.nameservers.get().map(Vec::as_slice).unwrap_or_default())
    }

    /// Replace the nameservers. The registrar takes between 2 and 12.
    pub async fn update_nameservers(&mut self, nameservers: &[String]) -> Result<(), EnomError> {
        if !(MIN_NAMESERVERS..=MAX_NAMESERVERS).contains(&nameservers.len()) {
            return Err(EnomError::InvalidNameServerCount(nameservers.len()));
        }

        let mut params = Self::base_params("ModifyNS", &self.sld, &self.tld);
        for (i, nameserver) in nameservers.iter().enumerate() {
            params.set(format!("NS{}", i + 1), nameserver);
        }

        info!("Updating nameservers for {}", self.name);
        self.client.request(params).await?;
        self.nameservers = Cached::Resolved(nameservers.to_vec());
        Ok(())
    }

    pub async fn registration_status(&mut self) -> Result<&str, EnomError> {
        if !self.registration_status.is_resolved() {
            self.fetch_extended_attributes().await?;
        }
        Ok(self.registration_status.get().map(String::as_str).unwrap_or_default())
    }

    pub async fn is_active(&mut self) -> Result<bool, EnomError> {
        Ok(self.registration_status().await? == "Registered")
    }

    pub async fn is_expired(&mut self) -> Result<bool, EnomError> {
        Ok(self.registration_status().await? == "Expired")
    }

    /// `Domain::renew` for this domain.
    pub async fn renew_registration(&self, options: RenewOptions) -> Result<Self, EnomError> {
        Self::renew(&self.client, &self.name, options).await
    }

    // Domains listed by `all` lack nameservers and status; one
    // `GetDomainInfo` fills in whichever is still unresolved.
    async fn fetch_extended_attributes(&mut self) -> Result<(), EnomError> {
        let response = self
            .client
            .request(Self::base_params("GetDomainInfo", &self.sld, &self.tld))
            .await?;
        let extended = response::extended_attributes(response::domain_info(&response)?)?;
        self.apply_extended(extended);
        Ok(())
    }

    // Resolved values are local and win over the registrar's copy
    fn apply_extended(&mut self, extended: ExtendedAttributes) {
        self.nameservers.fill(extended.nameservers);
        self.registration_status.fill(extended.registration_status);
    }
}
