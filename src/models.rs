use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Project tracks a group can be registered under, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    CourseAutomation,
    Demo,
    Essay,
    ExecutableTutorial,
    Feedback,
    OpenSource,
    Presentation,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::CourseAutomation,
        Category::Demo,
        Category::Essay,
        Category::ExecutableTutorial,
        Category::Feedback,
        Category::OpenSource,
        Category::Presentation,
    ];

    /// Directory name used for this track under the contributions root.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::CourseAutomation => "course-automation",
            Category::Demo => "demo",
            Category::Essay => "essay",
            Category::ExecutableTutorial => "executable-tutorial",
            Category::Feedback => "feedback",
            Category::OpenSource => "open-source",
            Category::Presentation => "presentation",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == needle)
            .ok_or_else(|| format!("unknown category `{}`", value.trim()))
    }
}

/// Lower-cased local part of an institutional email.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentHandle(String);

impl StudentHandle {
    /// Normalizes `value` into a handle. Accepts a bare handle or a full
    /// email address; returns `None` when nothing usable remains.
    pub fn new(value: impl AsRef<str>) -> Option<Self> {
        let trimmed = value.as_ref().trim();
        let local = trimmed.split('@').next().unwrap_or_default().trim();
        if local.is_empty() {
            None
        } else {
            Some(Self(local.to_lowercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
    pub handle: StudentHandle,
    pub completed_categories: BTreeSet<Category>,
    /// Total group memberships, counting repeats within one category.
    pub collaboration_count: u32,
    pub past_partners: BTreeSet<StudentHandle>,
}

impl Student {
    pub fn new(handle: StudentHandle) -> Self {
        Self {
            handle,
            completed_categories: BTreeSet::new(),
            collaboration_count: 0,
            past_partners: BTreeSet::new(),
        }
    }

    pub fn has_completed(&self, category: Category) -> bool {
        self.completed_categories.contains(&category)
    }
}

/// Raw group folder names per category, as listed by a group source.
pub type GroupListing = BTreeMap<Category, Vec<String>>;

/// One historical team, already split into its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub category: Category,
    /// Folder name the members were parsed from.
    pub entry: String,
    pub members: Vec<StudentHandle>,
}

/// Per-student collaboration history, kept in roster order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParticipationLedger {
    students: Vec<Student>,
    #[serde(skip)]
    index: HashMap<StudentHandle, usize>,
}

impl ParticipationLedger {
    /// Builds a ledger from ready-made records. The first record wins when a
    /// handle repeats.
    pub fn from_students(records: impl IntoIterator<Item = Student>) -> Self {
        let mut ledger = Self::default();
        for student in records {
            if ledger.index.contains_key(&student.handle) {
                continue;
            }
            ledger.index.insert(student.handle.clone(), ledger.students.len());
            ledger.students.push(student);
        }
        ledger
    }

    pub fn get(&self, handle: &StudentHandle) -> Option<&Student> {
        self.index.get(handle).map(|&position| &self.students[position])
    }

    pub fn contains(&self, handle: &StudentHandle) -> bool {
        self.index.contains_key(handle)
    }

    pub(crate) fn get_mut(&mut self, handle: &StudentHandle) -> Option<&mut Student> {
        match self.index.get(handle) {
            Some(&position) => self.students.get_mut(position),
            None => None,
        }
    }

    pub fn students(&self) -> impl Iterator<Item = &Student> {
        self.students.iter()
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryEligibility {
    AlreadyCompleted,
    Eligible(Vec<StudentHandle>),
}

/// Outcome for every category; iteration follows [`Category::ALL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityResult {
    pub requester: StudentHandle,
    pub categories: BTreeMap<Category, CategoryEligibility>,
}

impl EligibilityResult {
    pub fn get(&self, category: Category) -> Option<&CategoryEligibility> {
        self.categories.get(&category)
    }
}
