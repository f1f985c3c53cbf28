use crate::backend::{BackendClient, Direction};
use crate::constants::NO_STAFF_HINT;
use crate::error::{WardError, WardResult};
use crate::filter::{Categorized, EqualityFilter, Searchable};
use crate::model::{Role, User};
use crate::views::ListView;
use uuid::Uuid;

impl Searchable for User {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.email.as_str(),
        ]
    }
}

impl Categorized for User {
    type Category = Role;

    fn category(&self) -> Role {
        self.role
    }
}

/// Staff of an institution, most recently added first.
pub fn fetch_staff(client: &BackendClient, institution_id: Uuid) -> WardResult<Vec<User>> {
    Ok(client
        .from::<User>()
        .eq("institution_id", institution_id)
        .order("created_at", Direction::Descending)
        .execute()?)
}

/// Only doctors manage staff.
pub fn require_staff_manager(viewer: &User) -> WardResult<()> {
    if viewer.role == Role::Doctor {
        Ok(())
    } else {
        Err(WardError::Forbidden("staff management"))
    }
}

/// The staff management page.
pub struct StaffList {
    client: BackendClient,
    institution_id: Uuid,
    viewer_id: Uuid,
    view: ListView<User>,
}

impl StaffList {
    /// Opens the page and fetches, or fails without fetching when `viewer` is not a doctor.
    pub fn open(client: BackendClient, viewer: &User) -> WardResult<Self> {
        require_staff_manager(viewer)?;

        let mut list = Self {
            client,
            institution_id: viewer.institution_id,
            viewer_id: viewer.id,
            view: ListView::new("staff"),
        };
        list.refresh();
        Ok(list)
    }

    pub fn refresh(&mut self) {
        let ticket = self.view.begin_fetch();
        let result = fetch_staff(&self.client, self.institution_id);
        self.view.complete(ticket, result);
    }

    pub fn view(&self) -> &ListView<User> {
        &self.view
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.view.set_search(query);
    }

    pub fn set_role(&mut self, role: EqualityFilter<Role>) {
        self.view.set_filter(role);
    }

    pub fn visible(&self) -> Vec<&User> {
        self.view.visible()
    }

    /// Shows a member added by the add-staff form without refetching.
    pub fn add_member(&mut self, member: User) {
        self.view.prepend(member);
    }

    /// The viewer's own row offers no remove action.
    pub fn is_removable(&self, member: &User) -> bool {
        member.id != self.viewer_id
    }

    pub fn empty_hint(&self) -> Option<&'static str> {
        self.view.empty_hint(NO_STAFF_HINT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Ward;

    #[test]
    fn non_doctors_are_refused() {
        let ward = Ward::seeded();
        assert!(matches!(
            StaffList::open(ward.client(), &ward.nurse),
            Err(WardError::Forbidden(_))
        ));
        assert!(matches!(
            StaffList::open(ward.client(), &ward.junior),
            Err(WardError::Forbidden(_))
        ));
    }

    #[test]
    fn doctor_sees_own_institution_only() {
        let ward = Ward::seeded();
        let list = StaffList::open(ward.client(), &ward.doctor).unwrap();
        let emails: Vec<_> = list.view().rows().iter().map(|u| u.email.as_str()).collect();

        assert_eq!(list.view().rows().len(), 3);
        assert!(emails.contains(&ward.nurse.email.as_str()));
        assert!(!emails.contains(&ward.foreign_doctor.email.as_str()));
    }

    #[test]
    fn search_matches_one_surname() {
        let ward = Ward::seeded();
        let mut list = StaffList::open(ward.client(), &ward.doctor).unwrap();
        list.set_search("doe");

        let visible = list.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].last_name, "Doe");
    }

    #[test]
    fn search_covers_email_and_role_filter_narrows() {
        let ward = Ward::seeded();
        let mut list = StaffList::open(ward.client(), &ward.doctor).unwrap();

        list.set_search(ward.nurse.email.to_uppercase());
        assert_eq!(list.visible(), vec![&ward.nurse]);

        list.set_search("");
        list.set_role(EqualityFilter::Only(Role::JuniorDoctor));
        assert_eq!(list.visible(), vec![&ward.junior]);
    }

    #[test]
    fn added_member_is_listed_first() {
        let ward = Ward::seeded();
        let mut list = StaffList::open(ward.client(), &ward.doctor).unwrap();
        let newcomer = User {
            id: Uuid::new_v4(),
            email: "new@demo.com".into(),
            ..ward.nurse.clone()
        };

        list.add_member(newcomer.clone());
        assert_eq!(list.view().rows()[0], newcomer);
        assert!(list.is_removable(&newcomer));
        assert!(!list.is_removable(&ward.doctor));
    }
}
