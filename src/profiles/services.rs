use time::{format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime};
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    dto::{EducationRequest, ExperienceRequest, ProfileRequest, ProfileView},
    repo_types::{Education, Experience, Owner, Profile, Social},
};
use crate::{
    error::{AppError, AppResult},
    store::{parse_id, Store},
    validation::{present, Violations},
};

const NO_PROFILE: &str = "There is no profile for this user!";

/// Splits on the exact two-character separator `", "`, then trims each token.
/// `"a,b"` stays a single skill.
pub fn split_skills(raw: &str) -> Vec<String> {
    raw.split(", ").map(|s| s.trim().to_string()).collect()
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SocialUpdate {
    pub youtube: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
}

/// Sparse update: `None` leaves the stored value alone.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub status: Option<String>,
    pub githubusername: Option<String>,
    pub skills: Option<Vec<String>>,
    pub social: SocialUpdate,
}

impl TryFrom<ProfileRequest> for ProfileUpdate {
    type Error = AppError;

    fn try_from(req: ProfileRequest) -> AppResult<Self> {
        let mut v = Violations::new();
        v.require(req.status.as_deref(), "status", "Status is required!");
        v.require(req.skills.as_deref(), "skills", "Skills is required!");
        v.finish()?;

        Ok(Self {
            company: present(req.company),
            website: present(req.website),
            location: present(req.location),
            bio: present(req.bio),
            status: present(req.status),
            githubusername: present(req.githubusername),
            skills: present(req.skills).map(|s| split_skills(&s)),
            social: SocialUpdate {
                youtube: present(req.youtube),
                twitter: present(req.twitter),
                facebook: present(req.facebook),
                linkedin: present(req.linkedin),
                instagram: present(req.instagram),
            },
        })
    }
}

fn merge(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

impl ProfileUpdate {
    pub fn apply(self, p: &mut Profile) {
        merge(&mut p.company, self.company);
        merge(&mut p.website, self.website);
        merge(&mut p.location, self.location);
        merge(&mut p.bio, self.bio);
        merge(&mut p.status, self.status);
        merge(&mut p.githubusername, self.githubusername);
        if let Some(skills) = self.skills {
            p.skills = skills;
        }
        let s = &mut p.social;
        merge(&mut s.youtube, self.social.youtube);
        merge(&mut s.twitter, self.social.twitter);
        merge(&mut s.facebook, self.social.facebook);
        merge(&mut s.linkedin, self.social.linkedin);
        merge(&mut s.instagram, self.social.instagram);
    }

    pub fn into_profile(self, user: Uuid) -> Profile {
        let mut p = Profile {
            id: Uuid::new_v4(),
            user,
            company: None,
            website: None,
            location: None,
            bio: None,
            status: None,
            githubusername: None,
            skills: Vec::new(),
            social: Social::default(),
            experience: Vec::new(),
            education: Vec::new(),
            date: OffsetDateTime::now_utc(),
        };
        self.apply(&mut p);
        p
    }
}

pub async fn upsert_profile(store: &dyn Store, user_id: Uuid, req: ProfileRequest) -> AppResult<Profile> {
    let update = ProfileUpdate::try_from(req)?;

    let profile = match store.find_profile_by_user(user_id).await? {
        Some(mut existing) => {
            update.apply(&mut existing);
            debug!(%user_id, "updating profile");
            existing
        }
        None => {
            info!(%user_id, "creating profile");
            update.into_profile(user_id)
        }
    };
    Ok(store.upsert_profile(&profile).await?)
}

async fn with_owner(store: &dyn Store, profile: Profile) -> AppResult<ProfileView> {
    let owner = store.find_user_by_id(profile.user).await?.map(|u| Owner {
        name: u.name,
        avatar: u.avatar,
    });
    Ok(ProfileView { profile, owner })
}

pub async fn my_profile(store: &dyn Store, user_id: Uuid) -> AppResult<ProfileView> {
    let profile = store
        .find_profile_by_user(user_id)
        .await?
        .ok_or(AppError::NotFound(NO_PROFILE))?;
    with_owner(store, profile).await
}

pub async fn all_profiles(store: &dyn Store) -> AppResult<Vec<ProfileView>> {
    let profiles = store.list_profiles().await?;
    Ok(profiles
        .into_iter()
        .map(|(profile, owner)| ProfileView { profile, owner })
        .collect())
}

pub async fn profile_by_user(store: &dyn Store, raw_user_id: &str) -> AppResult<ProfileView> {
    let user_id = parse_id(raw_user_id, "Profile not found!")?;
    let profile = store
        .find_profile_by_user(user_id)
        .await?
        .ok_or(AppError::NotFound("Profile not found!"))?;
    with_owner(store, profile).await
}

/// Removes the user; their profile and posts go with it.
pub async fn delete_account(store: &dyn Store, user_id: Uuid) -> AppResult<()> {
    store.delete_user(user_id).await?;
    info!(%user_id, "account removed");
    Ok(())
}

pub fn parse_date(raw: &str) -> Option<Date> {
    let ymd = format_description!("[year]-[month]-[day]");
    Date::parse(raw, &ymd)
        .ok()
        .or_else(|| OffsetDateTime::parse(raw, &Rfc3339).ok().map(|d| d.date()))
}

/// Validates `from` (required) and `to` (optional) together.
fn date_range(
    v: &mut Violations,
    from: Option<&str>,
    to: Option<&str>,
) -> (Option<Date>, Option<Date>) {
    let from_present = from.is_some_and(|f| !f.is_empty());
    v.check(from_present, "from", "From date is required!");
    let from = from.filter(|_| from_present).and_then(|f| {
        let d = parse_date(f);
        v.check(d.is_some(), "from", "From date is invalid!");
        d
    });
    let to = present(to.map(str::to_string)).and_then(|t| {
        let d = parse_date(&t);
        v.check(d.is_some(), "to", "To date is invalid!");
        d
    });
    (from, to)
}

impl TryFrom<ExperienceRequest> for Experience {
    type Error = AppError;

    fn try_from(req: ExperienceRequest) -> AppResult<Self> {
        let mut v = Violations::new();
        v.require(req.title.as_deref(), "title", "Title is required!");
        v.require(req.company.as_deref(), "company", "Company is required!");
        let (from, to) = date_range(&mut v, req.from.as_deref(), req.to.as_deref());
        v.finish()?;

        Ok(Self {
            id: Uuid::new_v4(),
            title: req.title.unwrap_or_default(),
            company: req.company.unwrap_or_default(),
            location: present(req.location),
            from: from.ok_or_else(|| anyhow::anyhow!("validated from date missing"))?,
            to,
            current: req.current.unwrap_or(false),
            description: present(req.description),
        })
    }
}

impl TryFrom<EducationRequest> for Education {
    type Error = AppError;

    fn try_from(req: EducationRequest) -> AppResult<Self> {
        let mut v = Violations::new();
        v.require(req.school.as_deref(), "school", "School is required!");
        v.require(req.degree.as_deref(), "degree", "Degree is required!");
        v.require(
            req.fieldofstudy.as_deref(),
            "fieldofstudy",
            "Field of study is required!",
        );
        let (from, to) = date_range(&mut v, req.from.as_deref(), req.to.as_deref());
        v.finish()?;

        Ok(Self {
            id: Uuid::new_v4(),
            school: req.school.unwrap_or_default(),
            degree: req.degree.unwrap_or_default(),
            fieldofstudy: req.fieldofstudy.unwrap_or_default(),
            from: from.ok_or_else(|| anyhow::anyhow!("validated from date missing"))?,
            to,
            current: req.current.unwrap_or(false),
            description: present(req.description),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Experience,
    Education,
}

impl EntryKind {
    fn removed_msg(self) -> &'static str {
        match self {
            EntryKind::Experience => "Experience removed!",
            EntryKind::Education => "Education removed!",
        }
    }

    fn missing_msg(self) -> &'static str {
        match self {
            EntryKind::Experience => "This experience not found!",
            EntryKind::Education => "This Education not found!",
        }
    }
}

/// Outcome of removing a list entry. A missing entry is not an error.
#[derive(Debug)]
pub enum Removal {
    Removed { profile: Profile, msg: &'static str },
    Missing { msg: &'static str },
}

async fn load_own(store: &dyn Store, user_id: Uuid) -> AppResult<Profile> {
    store
        .find_profile_by_user(user_id)
        .await?
        .ok_or(AppError::NotFound(NO_PROFILE))
}

pub async fn add_experience(store: &dyn Store, user_id: Uuid, req: ExperienceRequest) -> AppResult<Profile> {
    let entry = Experience::try_from(req)?;
    let mut profile = load_own(store, user_id).await?;
    profile.experience.insert(0, entry);
    Ok(store.upsert_profile(&profile).await?)
}

pub async fn add_education(store: &dyn Store, user_id: Uuid, req: EducationRequest) -> AppResult<Profile> {
    let entry = Education::try_from(req)?;
    let mut profile = load_own(store, user_id).await?;
    profile.education.insert(0, entry);
    Ok(store.upsert_profile(&profile).await?)
}

/// Splices out the entry at its index; remaining entries keep their order.
pub fn remove_entry_in(profile: &mut Profile, kind: EntryKind, entry_id: Uuid) -> bool {
    let index = match kind {
        EntryKind::Experience => profile.experience.iter().position(|e| e.id == entry_id),
        EntryKind::Education => profile.education.iter().position(|e| e.id == entry_id),
    };
    match (kind, index) {
        (EntryKind::Experience, Some(i)) => {
            profile.experience.remove(i);
            true
        }
        (EntryKind::Education, Some(i)) => {
            profile.education.remove(i);
            true
        }
        (_, None) => false,
    }
}

pub async fn remove_entry(
    store: &dyn Store,
    user_id: Uuid,
    kind: EntryKind,
    raw_entry_id: &str,
) -> AppResult<Removal> {
    let mut profile = load_own(store, user_id).await?;

    // a malformed id can never match, so it is reported the same way as an unknown one
    let removed = Uuid::parse_str(raw_entry_id)
        .map(|id| remove_entry_in(&mut profile, kind, id))
        .unwrap_or(false);
    if !removed {
        debug!(%user_id, ?kind, entry = raw_entry_id, "entry not found");
        return Ok(Removal::Missing {
            msg: kind.missing_msg(),
        });
    }

    let profile = store.upsert_profile(&profile).await?;
    Ok(Removal::Removed {
        profile,
        msg: kind.removed_msg(),
    })
}
